use crate::core::geometry::{Fold, Vec2};
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::f64::consts::TAU;
use std::fmt;

/// Small integer label grouping bodies for elasticity rules and dispatch filtering.
pub type Tag = u8;

/// Engine-assigned body identifier. Never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Version value marking a body that has been removed from the engine.
const DISABLED: u64 = u64::MAX;

/// Circular sub-element of a body, fixed in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    position: Vec2,
    mass: f64,
    radius: f64,
}

impl Atom {
    /// Create an atom at `position` in the body's local frame.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `mass` or `radius` is non-positive or any input is NaN/inf.
    pub fn new(position: Vec2, mass: f64, radius: f64) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("atom mass must be finite and > 0".into()));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("atom radius must be finite and > 0".into()));
        }
        if !position.is_finite() {
            return Err(Error::InvalidParam("atom position must be finite".into()));
        }
        Ok(Self {
            position,
            mass,
            radius,
        })
    }

    /// Offset from the owning body's center of mass (after construction).
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// A rigid composite of atoms ("molecule") with pose, velocity, version and tags.
///
/// Kinematic state is stored as of `time()`; positions at later instants are obtained by
/// straight-line translation plus constant-rate rotation.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    atoms: Vec<Atom>,

    position: Vec2,
    velocity: Vec2,
    orientation: f64,
    angular_velocity: f64,

    mass: f64,
    radius: f64,
    inertia: f64,

    time: f64,
    version: u64,
    tags: BTreeSet<Tag>,
    references: usize,
    cell: (usize, usize),
}

impl Body {
    /// Build a body from its atoms, recentering them on their common center of mass.
    ///
    /// Mass is the sum of atom masses, the bounding radius is the farthest atom edge from the
    /// center of mass, and the moment of inertia sums each atom's disc inertia shifted by
    /// Steiner's theorem.
    pub fn new(
        atoms: Vec<Atom>,
        position: Vec2,
        velocity: Vec2,
        orientation: f64,
        angular_velocity: f64,
    ) -> Result<Self> {
        if atoms.is_empty() {
            return Err(Error::InvalidParam("a body needs at least one atom".into()));
        }
        if !position.is_finite() {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !velocity.is_finite() {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        if !orientation.is_finite() || !angular_velocity.is_finite() {
            return Err(Error::InvalidParam(
                "orientation and angular velocity must be finite".into(),
            ));
        }

        let mass: f64 = atoms.iter().map(Atom::mass).sum();
        let center = atoms
            .iter()
            .fold(Vec2::ZERO, |acc, a| acc + a.position * a.mass)
            / mass;

        let mut atoms = atoms;
        for a in &mut atoms {
            a.position -= center;
        }

        let radius = atoms
            .iter()
            .map(|a| a.position.norm() + a.radius)
            .fold(0.0, f64::max);
        let inertia = atoms
            .iter()
            .map(|a| a.mass * (0.5 * a.radius * a.radius + a.position.norm_squared()))
            .sum();

        Ok(Self {
            id: BodyId::default(),
            atoms,
            position,
            velocity,
            orientation,
            angular_velocity,
            mass,
            radius,
            inertia,
            time: 0.0,
            version: 0,
            tags: BTreeSet::new(),
            references: 0,
            cell: (0, 0),
        })
    }

    /// Convenience constructor for a single-atom body with zero orientation and spin.
    pub fn single(position: Vec2, velocity: Vec2, mass: f64, radius: f64) -> Result<Self> {
        Self::new(
            vec![Atom::new(Vec2::ZERO, mass, radius)?],
            position,
            velocity,
            0.0,
            0.0,
        )
    }

    // ============ Getters ============

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    #[inline]
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    #[inline]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Bounding radius around the center of mass.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// Instant the kinematic state refers to.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.version == DISABLED
    }

    /// Grid cell the body is currently indexed under.
    #[inline]
    pub fn cell(&self) -> (usize, usize) {
        self.cell
    }

    /// Number of pending events predicted from the current version.
    #[inline]
    pub fn references(&self) -> usize {
        self.references
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tags.iter().copied()
    }

    #[inline]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    #[inline]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// The body's tag when it carries exactly one.
    pub fn single_tag(&self) -> Option<Tag> {
        if self.tags.len() == 1 {
            self.tags.iter().next().copied()
        } else {
            None
        }
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    #[inline]
    pub fn angular_momentum(&self) -> f64 {
        self.angular_velocity * self.inertia
    }

    /// Translational plus rotational kinetic energy.
    pub fn energy(&self) -> f64 {
        0.5 * (self.mass * self.velocity.norm_squared()
            + self.inertia * self.angular_velocity * self.angular_velocity)
    }

    /// World position of atom `index` at the body's own time, shifted by `fold`.
    pub fn atom_position(&self, index: usize, fold: Fold) -> Vec2 {
        self.position + fold.offset() + self.atoms[index].position.rotated(self.orientation)
    }

    /// Offset of atom `index` from the center of mass under the current orientation.
    #[inline]
    pub fn atom_offset(&self, index: usize) -> Vec2 {
        self.atoms[index].position.rotated(self.orientation)
    }

    /// World position of atom `index` extrapolated to `time`, shifted by `fold`.
    pub fn atom_position_at(&self, index: usize, time: f64, fold: Fold) -> Vec2 {
        let dt = time - self.time;
        self.position
            + fold.offset()
            + self.velocity * dt
            + self.atoms[index]
                .position
                .rotated(self.orientation + self.angular_velocity * dt)
    }

    /// Center of mass extrapolated to `time`.
    pub fn position_at(&self, time: f64) -> Vec2 {
        self.position + self.velocity * (time - self.time)
    }

    // ============ Kinematics ============

    /// Advance pose to `time`. No-op if `time` is not later than the body's own time.
    pub fn integrate(&mut self, time: f64) {
        if self.time < time {
            let dt = time - self.time;
            self.position += self.velocity * dt;
            self.orientation = (self.orientation + (self.angular_velocity * dt) % TAU) % TAU;
            self.time = time;
        }
    }

    /// Apply `impulse` at `offset` from the center of mass.
    pub fn apply_impulse(&mut self, offset: Vec2, impulse: Vec2) {
        self.velocity = (self.velocity * self.mass + impulse) / self.mass;
        self.angular_velocity =
            (self.inertia * self.angular_velocity + offset.cross(impulse)) / self.inertia;
    }

    /// Rescale linear and angular velocity so the total energy equals `target`.
    ///
    /// Returns `false` (leaving the body untouched) if the body is at rest or `target` is
    /// negative, since no rescaling can reach the target then.
    pub fn scale_energy(&mut self, target: f64) -> bool {
        let current = self.energy();
        if current <= 0.0 || !target.is_finite() || target < 0.0 {
            log::warn!(
                "cannot rescale energy of body {} from {} to {}",
                self.id,
                current,
                target
            );
            return false;
        }
        let ratio = (target / current).sqrt();
        self.velocity *= ratio;
        self.angular_velocity *= ratio;
        true
    }

    /// Direct velocity override, only meaningful for single-atom bodies.
    pub fn set_velocity(&mut self, velocity: Vec2) -> Result<()> {
        if self.atoms.len() != 1 {
            return Err(Error::InvalidParam(
                "velocity override is reserved for single-atom bodies".into(),
            ));
        }
        if !velocity.is_finite() {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        self.velocity = velocity;
        Ok(())
    }

    /// Toroidal wrap: shift the position by whole unit squares.
    #[inline]
    pub fn teleport(&mut self, fold: Fold) {
        self.position += fold.offset();
    }

    // ============ Engine bookkeeping ============

    pub(crate) fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn set_cell(&mut self, cell: (usize, usize)) {
        self.cell = cell;
    }

    /// Drop engine bookkeeping carried over from a previous engine (e.g. a cloned live body).
    pub(crate) fn reset_bookkeeping(&mut self, id: BodyId, time: f64) {
        self.id = id;
        self.time = time;
        self.version = 0;
        self.references = 0;
        self.tags.clear();
    }

    /// Invalidate every prediction computed from the current state.
    #[inline]
    pub(crate) fn bump_version(&mut self) {
        if !self.is_disabled() {
            self.version = (self.version + 1).min(DISABLED - 1);
        }
    }

    #[inline]
    pub(crate) fn disable(&mut self) {
        self.version = DISABLED;
    }

    pub(crate) fn add_tag(&mut self, tag: Tag) -> bool {
        self.tags.insert(tag)
    }

    pub(crate) fn remove_tag(&mut self, tag: Tag) -> bool {
        self.tags.remove(&tag)
    }

    #[inline]
    pub(crate) fn incref(&mut self) {
        self.references += 1;
    }

    #[inline]
    pub(crate) fn decref(&mut self) {
        self.references = self.references.saturating_sub(1);
    }
}
