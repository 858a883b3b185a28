use crate::core::body::Body;
use crate::core::elements::{Bumper, XLine};
use crate::core::event::BodyRef;
use crate::core::grid::Grid;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use slab::Slab;

/// World state events resolve against: body arena, grid, boundary elements and the random
/// source used by thermal elements.
#[derive(Debug)]
pub struct Space {
    pub(crate) grid: Grid,
    pub(crate) bodies: Slab<Body>,
    pub(crate) bumpers: Vec<Bumper>,
    pub(crate) xlines: Vec<XLine>,
    pub(crate) rng: StdRng,
}

impl Space {
    pub(crate) fn new(grid: Grid, rng: StdRng) -> Self {
        Self {
            grid,
            bodies: Slab::new(),
            bumpers: Vec::new(),
            xlines: Vec::new(),
            rng,
        }
    }

    /// Whether `r` still names a live body at the version it was captured with.
    pub fn is_current(&self, r: BodyRef) -> bool {
        self.bodies
            .get(r.key)
            .is_some_and(|b| !b.is_disabled() && b.version() == r.version)
    }

    pub(crate) fn body(&self, key: usize) -> Result<&Body> {
        self.bodies.get(key).ok_or_else(|| missing(key))
    }

    pub(crate) fn body_mut(&mut self, key: usize) -> Result<&mut Body> {
        self.bodies.get_mut(key).ok_or_else(|| missing(key))
    }

    /// Mutable access to two distinct bodies at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Result<(&mut Body, &mut Body)> {
        self.bodies
            .get2_mut(a, b)
            .ok_or_else(|| Error::invariant(format!("arena slots {a} and {b} are not two live bodies")))
    }
}

pub(crate) fn missing(key: usize) -> Error {
    Error::invariant(format!("arena slot {key} holds no body"))
}
