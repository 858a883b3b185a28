//! Event kinds and the time-of-impact helpers they share.
//!
//! Single-atom bodies use closed-form circle intersection. Multi-atom bodies first bound the
//! contact to a window using their bounding circles, then scan that window in bins no wider
//! than a quarter turn of the combined spin, searching every atom pair in each bin. Bodies at
//! rest relative to each other but with overlapping bounding circles are scanned over one full
//! turn of the slowest spinner.

mod bumper;
mod collision;
mod crossing;
mod xline;

pub use bumper::BumperHit;
pub use collision::Collision;
pub use crossing::Crossing;
pub use xline::XLineHit;

use crate::core::geometry::Vec2;
use crate::core::roots::first_contact;
use std::f64::consts::{FRAC_PI_2, TAU};

/// Earliest non-negative delay after which two circles whose centers are `d` apart and close
/// at relative velocity `u` come within `reach` of each other.
///
/// `d` points from the first circle to the second and `u` is the velocity of the second
/// relative to the first. Separating or parallel motion yields `None`.
pub(crate) fn closing_time(d: Vec2, u: Vec2, reach: f64) -> Option<f64> {
    let a = u.norm_squared();
    let b = 2.0 * d.dot(u);
    let c = d.norm_squared() - reach * reach;
    if a == 0.0 || b >= 0.0 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    Some(((-b - disc.sqrt()) / (2.0 * a)).max(0.0))
}

/// Time for the slowest of the spinning bodies to make a full turn, `None` if none spins.
pub(crate) fn full_turn(spins: &[f64]) -> Option<f64> {
    spins
        .iter()
        .map(|w| w.abs())
        .filter(|&w| w > 0.0)
        .min_by(f64::total_cmp)
        .map(|w| TAU / w)
}

/// Delays `(begin, end)` during which two bounding circles overlap, clipped to the future.
///
/// Circles that do not move relative to each other overlap forever if they overlap now; the
/// window is then one `turn` long, or `None` when nothing spins.
pub(crate) fn overlap_window(d: Vec2, u: Vec2, reach: f64, turn: Option<f64>) -> Option<(f64, f64)> {
    let a = u.norm_squared();
    let c = d.norm_squared() - reach * reach;
    if a == 0.0 {
        return turn.filter(|_| c <= 0.0).map(|p| (0.0, p));
    }
    let b = 2.0 * d.dot(u);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let (t1, t2) = ((-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a));
    if t2 <= 0.0 {
        return None;
    }
    Some((t1.max(0.0), t2))
}

/// Earliest contact between any of `pairs` in `[begin, end]`.
///
/// The window is cut into bins of a quarter turn at angular speed `spin`, so each pair's gap
/// function has a single minimum per bin. Bins are scanned in order and the first bin with a
/// hit wins. `gap(pair, t)` must be positive while the pair is apart.
pub(crate) fn scan<F>(
    begin: f64,
    end: f64,
    spin: f64,
    pairs: &[(usize, usize)],
    gap: F,
) -> Option<(f64, (usize, usize))>
where
    F: Fn((usize, usize), f64) -> f64,
{
    let width = if spin > 0.0 {
        FRAC_PI_2 / spin
    } else {
        end - begin
    };
    if !(width > 0.0) {
        return None;
    }

    let mut lo = begin;
    while lo < end {
        let hi = (lo + width).min(end);
        if hi <= lo {
            break;
        }
        let mut best: Option<(f64, (usize, usize))> = None;
        for &pair in pairs {
            if let Some(t) = first_contact(|t| gap(pair, t), lo, hi) {
                if best.map_or(true, |(b, _)| t < b) {
                    best = Some((t, pair));
                }
            }
        }
        if best.is_some() {
            return best;
        }
        lo = hi;
    }
    None
}
