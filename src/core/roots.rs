//! Scalar numerics for time-of-impact searches on rotating bodies.
//!
//! Everything here works on a plain `Fn(f64) -> f64` and a time window, so it can be tested
//! without any engine state. The contact function is the signed squared gap between two
//! circles: positive while apart, negative while overlapping.

/// `1 / φ`, the golden-section shrink factor.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Hard cap on iterations for both searches.
const MAX_ITER: usize = 200;

/// Finite-difference step that tells an approaching contact from a receding one.
pub const TIME_EPSILON: f64 = 1e-9;

#[inline]
fn tolerance(a: f64, b: f64) -> f64 {
    4.0 * f64::EPSILON * (1.0 + a.abs().max(b.abs()))
}

/// Location of a local minimum of `f` on `[lo, hi]` (golden-section search).
///
/// The endpoints are compared with the converged interior point, so monotone functions yield
/// the exact endpoint.
pub fn golden_min<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64) -> f64 {
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let (lo, hi) = (a, b);

    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let (mut fc, mut fd) = (f(c), f(d));

    for _ in 0..MAX_ITER {
        if (b - a).abs() <= tolerance(a, b) {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d);
        }
    }

    let mid = 0.5 * (a + b);
    [lo, mid, hi]
        .into_iter()
        .map(|t| (t, f(t)))
        .fold((mid, f64::INFINITY), |best, cand| if cand.1 < best.1 { cand } else { best })
        .0
}

/// Location of a local maximum of `f` on `[lo, hi]`.
pub fn golden_max<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64) -> f64 {
    golden_min(|t| -f(t), lo, hi)
}

/// Zero of `f` between `x0` and `x1`, refined with a bracket-safeguarded secant iteration.
///
/// If `f` does not change sign across the two points, the point with the smaller `|f|` is
/// returned unchanged.
pub fn secant<F: Fn(f64) -> f64>(f: F, x0: f64, x1: f64) -> f64 {
    let (f0, f1) = (f(x0), f(x1));
    if f0 == 0.0 {
        return x0;
    }
    if f1 == 0.0 {
        return x1;
    }
    if f0.signum() == f1.signum() {
        return if f0.abs() < f1.abs() { x0 } else { x1 };
    }

    let (mut lo, mut flo, mut hi) = (x0, f0, x1);
    let (mut prev, mut fprev, mut cur, mut fcur) = (x0, f0, x1, f1);

    for _ in 0..MAX_ITER {
        let (left, right) = (lo.min(hi), lo.max(hi));
        let denom = fcur - fprev;
        let mut next = if denom != 0.0 {
            cur - fcur * (cur - prev) / denom
        } else {
            f64::NAN
        };
        if !(next > left && next < right) {
            next = 0.5 * (lo + hi);
        }

        let fnext = f(next);
        if fnext == 0.0 {
            return next;
        }
        if fnext.signum() == flo.signum() {
            lo = next;
            flo = fnext;
        } else {
            hi = next;
        }

        prev = cur;
        fprev = fcur;
        cur = next;
        fcur = fnext;

        if (cur - prev).abs() <= tolerance(cur, prev) || (hi - lo).abs() <= tolerance(lo, hi) {
            break;
        }
    }
    cur
}

/// Earliest instant in `[lo, hi]` at which the contact function `gap` turns negative while
/// still decreasing.
///
/// The window must be short enough for `gap` to have a single local minimum in it. Contacts
/// that are already separating (gap increasing at the crossing) are ignored.
pub fn first_contact<F: Fn(f64) -> f64>(gap: F, lo: f64, hi: f64) -> Option<f64> {
    let tmin = golden_min(&gap, lo, hi);
    if gap(tmin) > 0.0 {
        return None;
    }
    let tmax = golden_max(&gap, lo, tmin);
    let zero = if gap(tmax) <= 0.0 {
        tmax
    } else {
        secant(&gap, tmax, tmin)
    };
    (gap(zero + TIME_EPSILON) < gap(zero)).then_some(zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_min_parabola() {
        let t = golden_min(|t| (t - 0.3) * (t - 0.3), 0.0, 1.0);
        assert!((t - 0.3).abs() < 1e-7, "t = {t}");
    }

    #[test]
    fn golden_on_monotone_returns_endpoint() {
        assert_eq!(golden_min(|t| -t, 0.0, 2.0), 2.0);
        assert_eq!(golden_max(|t| -t, 0.5, 2.0), 0.5);
    }

    #[test]
    fn secant_finds_sqrt_two() {
        let r = secant(|x| x * x - 2.0, 2.0, 0.0);
        assert!((r - 2.0_f64.sqrt()).abs() < 1e-14, "r = {r}");
    }

    #[test]
    fn secant_without_sign_change_returns_closest() {
        assert_eq!(secant(|x| x * x + 1.0, 0.5, 2.0), 0.5);
    }

    #[test]
    fn head_on_contact() {
        // Centers 0.6 apart closing at speed 2, radii summing to 0.1.
        let gap = |t: f64| (0.6 - 2.0 * t).powi(2) - 0.01;
        let t = first_contact(gap, 0.0, 0.5).unwrap();
        assert!((t - 0.25).abs() < 1e-12, "t = {t}");
    }

    #[test]
    fn receding_contact_is_ignored() {
        // Touching at t = 0 and moving apart.
        let gap = |t: f64| (0.1 + t).powi(2) - 0.01;
        assert!(first_contact(gap, 0.0, 1.0).is_none());
    }

    #[test]
    fn near_miss_is_ignored() {
        // Passes with a closest approach of 0.15 against a contact distance of 0.1.
        let gap = |t: f64| (0.5 - t).powi(2) + 0.15_f64.powi(2) - 0.01;
        assert!(first_contact(gap, 0.0, 1.0).is_none());
    }

    #[test]
    fn rotating_arm_sweeps_into_point() {
        // A point on a unit-length arm spinning at 1 rad/s from angle 0, target at angle π/4
        // on the same circle; contact radius 0.1.
        let target = (std::f64::consts::FRAC_PI_4.cos(), std::f64::consts::FRAC_PI_4.sin());
        let gap = |t: f64| {
            let (s, c) = t.sin_cos();
            (c - target.0).powi(2) + (s - target.1).powi(2) - 0.01
        };
        let t = first_contact(gap, 0.0, std::f64::consts::FRAC_PI_2).unwrap();
        // Chord of length 0.1 on a unit circle subtends 2·asin(0.05).
        let expected = std::f64::consts::FRAC_PI_4 - 2.0 * 0.05_f64.asin();
        assert!((t - expected).abs() < 1e-10, "t = {t}, expected {expected}");
    }
}
