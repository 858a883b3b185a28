use super::{closing_time, full_turn, overlap_window, scan};
use crate::core::body::Body;
use crate::core::dispatch::Dispatcher;
use crate::core::event::BodyRef;
use crate::core::geometry::Fold;
use crate::core::report::{CollisionReport, Motion, Participant};
use crate::core::space::Space;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct Outcome {
    before: [Motion; 2],
    module: f64,
}

/// Two bodies colliding.
///
/// `alpha` is the body whose refresh produced the prediction; `fold` shifts it next to `beta`
/// across the torus seam.
#[derive(Debug, Clone)]
pub struct Collision {
    time: f64,
    alpha: BodyRef,
    beta: BodyRef,
    fold: Fold,
    atoms: (usize, usize),
    elasticity: f64,
    outcome: Option<Outcome>,
}

impl Collision {
    /// Predict the first contact between `alpha` (shifted by `fold`) and `beta`.
    pub fn predict(
        alpha_key: usize,
        alpha: &Body,
        fold: Fold,
        beta_key: usize,
        beta: &Body,
        elasticity: f64,
    ) -> Option<Self> {
        let t0 = alpha.time().max(beta.time());
        let d = beta.position_at(t0) - (alpha.position_at(t0) + fold.offset());
        let u = beta.velocity() - alpha.velocity();

        let (time, atoms) = if alpha.len() == 1 && beta.len() == 1 {
            let reach = alpha.atoms()[0].radius() + beta.atoms()[0].radius();
            (t0 + closing_time(d, u, reach)?, (0, 0))
        } else {
            let turn = full_turn(&[alpha.angular_velocity(), beta.angular_velocity()]);
            let (begin, end) = overlap_window(d, u, alpha.radius() + beta.radius(), turn)?;
            let pairs: Vec<(usize, usize)> = (0..alpha.len())
                .flat_map(|i| (0..beta.len()).map(move |j| (i, j)))
                .collect();
            let spin = alpha.angular_velocity().abs() + beta.angular_velocity().abs();
            scan(t0 + begin, t0 + end, spin, &pairs, |(i, j), t| {
                let reach = alpha.atoms()[i].radius() + beta.atoms()[j].radius();
                (alpha.atom_position_at(i, t, fold) - beta.atom_position_at(j, t, Fold::DIRECT))
                    .norm_squared()
                    - reach * reach
            })?
        };

        Some(Self {
            time,
            alpha: BodyRef::new(alpha_key, alpha.version()),
            beta: BodyRef::new(beta_key, beta.version()),
            fold,
            atoms,
            elasticity,
            outcome: None,
        })
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn alpha(&self) -> BodyRef {
        self.alpha
    }

    #[inline]
    pub fn beta(&self) -> BodyRef {
        self.beta
    }

    /// Contacting atom of each body.
    #[inline]
    pub fn atoms(&self) -> (usize, usize) {
        self.atoms
    }

    /// Coefficient of restitution captured at prediction time.
    #[inline]
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Exchange an impulse along the contact normal between the two atoms.
    pub(crate) fn resolve(&mut self, space: &mut Space) -> Result<bool> {
        if !space.is_current(self.alpha) || !space.is_current(self.beta) {
            return Ok(false);
        }
        let (a, b) = space.pair_mut(self.alpha.key, self.beta.key)?;
        a.integrate(self.time);
        b.integrate(self.time);
        a.bump_version();
        b.bump_version();
        let before = [Motion::of(a), Motion::of(b)];

        let (i, j) = self.atoms;
        let normal = (b.atom_position(j, Fold::DIRECT) - a.atom_position(i, self.fold))
            .normalized()
            .ok_or_else(|| {
                Error::MathError(format!(
                    "bodies {} and {} have coincident contact atoms",
                    a.id(),
                    b.id()
                ))
            })?;
        let ra = a.atom_offset(i) + normal * a.atoms()[i].radius();
        let rb = b.atom_offset(j) - normal * b.atoms()[j].radius();
        let (ca, cb) = (ra.cross(normal), rb.cross(normal));

        let closing = (a.velocity().dot(normal) + a.angular_velocity() * ca)
            - (b.velocity().dot(normal) + b.angular_velocity() * cb);
        let denom =
            1.0 / a.mass() + 1.0 / b.mass() + ca * ca / a.inertia() + cb * cb / b.inertia();
        let module = -(1.0 + self.elasticity) * closing / denom;

        a.apply_impulse(ra, normal * module);
        b.apply_impulse(rb, -(normal * module));
        log::trace!(
            "t={:.6}: collision {} <-> {} (atoms {:?}), module {:.6}",
            self.time,
            a.id(),
            b.id(),
            self.atoms,
            module
        );
        self.outcome = Some(Outcome { before, module });
        Ok(true)
    }

    pub(crate) fn notify(&self, dispatcher: &mut Dispatcher, space: &Space) {
        let Some(outcome) = self.outcome else {
            return;
        };
        if !dispatcher.wants::<Collision>() {
            return;
        }
        let (Some(a), Some(b)) = (
            space.bodies.get(self.alpha.key),
            space.bodies.get(self.beta.key),
        ) else {
            return;
        };
        let report = CollisionReport {
            time: self.time,
            module: outcome.module,
            elasticity: self.elasticity,
            alpha: Participant::capture(a, self.atoms.0, outcome.before[0]),
            beta: Participant::capture(b, self.atoms.1, outcome.before[1]),
        };
        dispatcher.trigger::<Collision>(&report);
    }
}
