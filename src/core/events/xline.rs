use super::{full_turn, scan};
use crate::core::body::Body;
use crate::core::dispatch::Dispatcher;
use crate::core::elements::{XLine, XLineId};
use crate::core::event::BodyRef;
use crate::core::geometry::{Fold, Vec2};
use crate::core::report::{Motion, Participant, XLineReport};
use crate::core::space::{missing, Space};
use crate::error::{Error, Result};

/// A body bouncing off an xline.
#[derive(Debug, Clone)]
pub struct XLineHit {
    time: f64,
    body: BodyRef,
    xline: XLineId,
    fold: Fold,
    atom: usize,
    outcome: Option<(Motion, f64)>,
}

impl XLineHit {
    /// Predict the first contact between `body` (shifted horizontally by `fold`) and `xline`.
    pub fn predict(key: usize, body: &Body, fold: Fold, id: XLineId, xline: &XLine) -> Option<Self> {
        let t0 = body.time();
        let wall = xline.x();
        let delta = body.position().x + fold.offset().x - wall;
        let vx = body.velocity().x;
        let speed = vx.abs();
        let approaching = delta * vx < 0.0;

        let (time, atom) = if body.len() == 1 {
            if !approaching {
                return None;
            }
            let radius = body.atoms()[0].radius();
            (t0 + (delta.abs() - radius).max(0.0) / speed, 0)
        } else {
            let reach = body.radius();
            let (begin, end) = if vx == 0.0 {
                // Only the spin can sweep an atom into the wall.
                if delta.abs() > reach {
                    return None;
                }
                (t0, t0 + full_turn(&[body.angular_velocity()])?)
            } else if delta.abs() <= reach {
                if approaching {
                    (t0, t0 + delta.abs() / speed)
                } else {
                    (t0, t0 + (reach - delta.abs()) / speed)
                }
            } else if approaching {
                (t0 + (delta.abs() - reach) / speed, t0 + delta.abs() / speed)
            } else {
                return None;
            };
            let pairs: Vec<(usize, usize)> = (0..body.len()).map(|i| (i, 0)).collect();
            let (t, (i, _)) = scan(begin, end, body.angular_velocity().abs(), &pairs, |(i, _), t| {
                let r = body.atoms()[i].radius();
                (body.atom_position_at(i, t, fold).x - wall).powi(2) - r * r
            })?;
            (t, i)
        };

        Some(Self {
            time,
            body: BodyRef::new(key, body.version()),
            xline: id,
            fold,
            atom,
            outcome: None,
        })
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn body(&self) -> BodyRef {
        self.body
    }

    #[inline]
    pub fn xline(&self) -> XLineId {
        self.xline
    }

    /// Reflect the body off the wall.
    ///
    /// Single-atom bodies hitting an x-only wall get their x-velocity rewritten directly and
    /// keep their y-velocity. Everything else takes a rigid impulse along the wall normal
    /// followed by the wall's thermal response.
    pub(crate) fn resolve(&mut self, space: &mut Space) -> Result<bool> {
        if !space.is_current(self.body) {
            return Ok(false);
        }
        let xline = space
            .xlines
            .get(self.xline.0)
            .ok_or_else(|| Error::invariant(format!("unknown xline {:?}", self.xline)))?;
        let key = self.body.key;
        let body = space.bodies.get_mut(key).ok_or_else(|| missing(key))?;
        body.integrate(self.time);
        body.bump_version();
        let before = Motion::of(body);

        let module = if body.len() == 1 && xline.x_only() {
            let v = body.velocity();
            let back = if v.x < 0.0 { 1.0 } else { -1.0 };
            let speed = xline
                .thermal()
                .target(v.x.abs(), &mut space.rng)
                .unwrap_or(v.x.abs());
            body.set_velocity(Vec2::new(back * speed, v.y))?;
            body.mass() * (body.velocity().x - v.x)
        } else {
            let i = self.atom;
            let p = body.atom_position(i, self.fold);
            let normal = Vec2::new(p.x - xline.x(), 0.0).normalized().ok_or_else(|| {
                Error::MathError(format!(
                    "atom {i} of body {} is centered on xline {:?}",
                    body.id(),
                    self.xline
                ))
            })?;
            let r = body.atom_offset(i) - normal * body.atoms()[i].radius();
            let c = r.cross(normal);
            let closing = body.velocity().dot(normal) + body.angular_velocity() * c;
            let module = -2.0 * closing / (1.0 / body.mass() + c * c / body.inertia());
            body.apply_impulse(r, normal * module);
            if let Some(target) = xline.thermal().target(body.energy(), &mut space.rng) {
                body.scale_energy(target);
            }
            module
        };
        log::trace!(
            "t={:.6}: body {} hit xline {:?}, module {:.6}",
            self.time,
            body.id(),
            self.xline,
            module
        );
        self.outcome = Some((before, module));
        Ok(true)
    }

    pub(crate) fn notify(&self, dispatcher: &mut Dispatcher, space: &Space) {
        let Some((before, module)) = self.outcome else {
            return;
        };
        if !dispatcher.wants::<XLineHit>() {
            return;
        }
        let (Some(body), Some(xline)) = (
            space.bodies.get(self.body.key),
            space.xlines.get(self.xline.0),
        ) else {
            return;
        };
        let report = XLineReport {
            time: self.time,
            module,
            body: Participant::capture(body, self.atom, before),
            xline: xline.clone(),
        };
        dispatcher.trigger::<XLineHit>(&report);
    }
}
