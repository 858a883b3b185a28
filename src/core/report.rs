//! Owned snapshots of resolved interactions, handed to subscribers.
//!
//! A participant is captured right after resolution together with its motion right before,
//! so deltas can be derived without touching the engine again.

use crate::core::body::{Body, BodyId, Tag};
use crate::core::elements::{Bumper, XLine};
use crate::core::geometry::Vec2;
use std::ops::Sub;

/// Translational and rotational velocity at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub velocity: Vec2,
    pub angular_velocity: f64,
}

impl Motion {
    pub fn of(body: &Body) -> Self {
        Self {
            velocity: body.velocity(),
            angular_velocity: body.angular_velocity(),
        }
    }
}

/// A quantity observed before and after an interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

impl<T: Copy + Sub<Output = T>> Change<T> {
    #[inline]
    pub fn delta(&self) -> T {
        self.after - self.before
    }
}

/// One body taking part in a resolved interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: BodyId,
    pub tags: Vec<Tag>,
    /// Index of the atom that made contact.
    pub atom: usize,
    pub mass: f64,
    pub inertia: f64,
    /// Center of mass at the time of contact.
    pub position: Vec2,
    pub orientation: f64,
    pub before: Motion,
    pub after: Motion,
}

impl Participant {
    pub(crate) fn capture(body: &Body, atom: usize, before: Motion) -> Self {
        Self {
            id: body.id(),
            tags: body.tags().collect(),
            atom,
            mass: body.mass(),
            inertia: body.inertia(),
            position: body.position(),
            orientation: body.orientation(),
            before,
            after: Motion::of(body),
        }
    }

    #[inline]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn velocity(&self) -> Change<Vec2> {
        Change {
            before: self.before.velocity,
            after: self.after.velocity,
        }
    }

    pub fn angular_velocity(&self) -> Change<f64> {
        Change {
            before: self.before.angular_velocity,
            after: self.after.angular_velocity,
        }
    }

    pub fn momentum(&self) -> Change<Vec2> {
        Change {
            before: self.before.velocity * self.mass,
            after: self.after.velocity * self.mass,
        }
    }

    pub fn angular_momentum(&self) -> Change<f64> {
        Change {
            before: self.before.angular_velocity * self.inertia,
            after: self.after.angular_velocity * self.inertia,
        }
    }

    /// Kinetic energy, translational plus rotational.
    pub fn energy(&self) -> Change<f64> {
        let energy = |m: &Motion| {
            0.5 * (self.mass * m.velocity.norm_squared()
                + self.inertia * m.angular_velocity * m.angular_velocity)
        };
        Change {
            before: energy(&self.before),
            after: energy(&self.after),
        }
    }
}

/// Body-body collision.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    pub time: f64,
    /// Signed impulse magnitude applied to `alpha` along the contact normal.
    pub module: f64,
    pub elasticity: f64,
    pub alpha: Participant,
    pub beta: Participant,
}

/// Body-bumper collision.
#[derive(Debug, Clone, PartialEq)]
pub struct BumperReport {
    pub time: f64,
    pub module: f64,
    pub body: Participant,
    pub bumper: Bumper,
}

/// Body-xline collision.
#[derive(Debug, Clone, PartialEq)]
pub struct XLineReport {
    pub time: f64,
    /// Impulse magnitude along the wall normal. For x-only reflections, the change of
    /// x-momentum.
    pub module: f64,
    pub body: Participant,
    pub xline: XLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_derives_conserved_quantities() {
        let p = Participant {
            id: BodyId(1),
            tags: vec![3],
            atom: 0,
            mass: 2.0,
            inertia: 0.5,
            position: Vec2::ZERO,
            orientation: 0.0,
            before: Motion {
                velocity: Vec2::new(1.0, 0.0),
                angular_velocity: 2.0,
            },
            after: Motion {
                velocity: Vec2::new(-1.0, 0.5),
                angular_velocity: 0.0,
            },
        };
        assert!(p.has_tag(3));
        assert_eq!(p.velocity().delta(), Vec2::new(-2.0, 0.5));
        assert_eq!(p.momentum().delta(), Vec2::new(-4.0, 1.0));
        assert_eq!(p.angular_momentum().before, 1.0);
        assert_eq!(p.angular_velocity().delta(), -2.0);
        assert!((p.energy().before - 2.0).abs() < 1e-12);
        assert!((p.energy().after - 1.25).abs() < 1e-12);
    }
}
