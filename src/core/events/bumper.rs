use super::{closing_time, full_turn, overlap_window, scan};
use crate::core::body::Body;
use crate::core::dispatch::Dispatcher;
use crate::core::elements::{Bumper, BumperId};
use crate::core::event::BodyRef;
use crate::core::geometry::Fold;
use crate::core::report::{BumperReport, Motion, Participant};
use crate::core::space::{missing, Space};
use crate::error::{Error, Result};

/// A body bouncing off a bumper.
#[derive(Debug, Clone)]
pub struct BumperHit {
    time: f64,
    body: BodyRef,
    bumper: BumperId,
    fold: Fold,
    atom: usize,
    outcome: Option<(Motion, f64)>,
}

impl BumperHit {
    /// Predict the first contact between `body` (shifted by `fold`) and `bumper`.
    pub fn predict(
        key: usize,
        body: &Body,
        fold: Fold,
        id: BumperId,
        bumper: &Bumper,
    ) -> Option<Self> {
        let t0 = body.time();
        let center = bumper.position();
        let d = center - (body.position() + fold.offset());
        let u = -body.velocity();

        let (time, atom) = if body.len() == 1 {
            let reach = body.atoms()[0].radius() + bumper.radius();
            (t0 + closing_time(d, u, reach)?, 0)
        } else {
            let turn = full_turn(&[body.angular_velocity()]);
            let (begin, end) = overlap_window(d, u, body.radius() + bumper.radius(), turn)?;
            let pairs: Vec<(usize, usize)> = (0..body.len()).map(|i| (i, 0)).collect();
            let (t, (i, _)) = scan(
                t0 + begin,
                t0 + end,
                body.angular_velocity().abs(),
                &pairs,
                |(i, _), t| {
                    let reach = body.atoms()[i].radius() + bumper.radius();
                    (body.atom_position_at(i, t, fold) - center).norm_squared() - reach * reach
                },
            )?;
            (t, i)
        };

        Some(Self {
            time,
            body: BodyRef::new(key, body.version()),
            bumper: id,
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
    pub fn bumper(&self) -> BumperId {
        self.bumper
    }

    /// Rigid reflection off the bumper surface, then the bumper's thermal response.
    pub(crate) fn resolve(&mut self, space: &mut Space) -> Result<bool> {
        if !space.is_current(self.body) {
            return Ok(false);
        }
        let bumper = space
            .bumpers
            .get(self.bumper.0)
            .ok_or_else(|| Error::invariant(format!("unknown bumper {:?}", self.bumper)))?;
        let key = self.body.key;
        let body = space.bodies.get_mut(key).ok_or_else(|| missing(key))?;
        body.integrate(self.time);
        body.bump_version();
        let before = Motion::of(body);

        let i = self.atom;
        let normal = (body.atom_position(i, self.fold) - bumper.position())
            .normalized()
            .ok_or_else(|| {
                Error::MathError(format!(
                    "atom {i} of body {} sits on the center of bumper {:?}",
                    body.id(),
                    self.bumper
                ))
            })?;
        let r = body.atom_offset(i) - normal * body.atoms()[i].radius();
        let c = r.cross(normal);
        let closing = body.velocity().dot(normal) + body.angular_velocity() * c;
        let module = -2.0 * closing / (1.0 / body.mass() + c * c / body.inertia());
        body.apply_impulse(r, normal * module);

        if let Some(target) = bumper.thermal().target(body.energy(), &mut space.rng) {
            body.scale_energy(target);
        }
        log::trace!(
            "t={:.6}: body {} hit bumper {:?}, module {:.6}",
            self.time,
            body.id(),
            self.bumper,
            module
        );
        self.outcome = Some((before, module));
        Ok(true)
    }

    pub(crate) fn notify(&self, dispatcher: &mut Dispatcher, space: &Space) {
        let Some((before, module)) = self.outcome else {
            return;
        };
        if !dispatcher.wants::<BumperHit>() {
            return;
        }
        let (Some(body), Some(bumper)) = (
            space.bodies.get(self.body.key),
            space.bumpers.get(self.bumper.0),
        ) else {
            return;
        };
        let report = BumperReport {
            time: self.time,
            module,
            body: Participant::capture(body, self.atom, before),
            bumper: bumper.clone(),
        };
        dispatcher.trigger::<BumperHit>(&report);
    }
}
