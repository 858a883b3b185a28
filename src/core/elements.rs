//! Static boundary elements: circular bumpers and vertical xlines.

use crate::core::geometry::Vec2;
use crate::error::{Error, Result};
use rand::Rng;
use serde::Deserialize;

/// How a boundary element modulates a body's energy after a collision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Thermal {
    /// Plain rigid rebound.
    #[default]
    None,
    /// Rebound value fixed to the given temperature.
    Fixed(f64),
    /// Rebound value drawn from an exponential distribution with the given rate.
    Random { rate: f64 },
    /// Rebound value scaled by a factor (an elasticity in disguise).
    Multiplicative(f64),
}

impl Thermal {
    /// Build from the boolean flag combination used by scenario files.
    ///
    /// A `temperature` of `None` means no thermal response. `randomness` and `multiplicative`
    /// are mutually exclusive.
    pub fn from_flags(temperature: Option<f64>, randomness: bool, multiplicative: bool) -> Result<Self> {
        if randomness && multiplicative {
            return Err(Error::InvalidParam(
                "a boundary element can't be random and multiplicative at the same time".into(),
            ));
        }
        let Some(t) = temperature else {
            if randomness || multiplicative {
                return Err(Error::InvalidParam(
                    "random and multiplicative elements need a temperature".into(),
                ));
            }
            return Ok(Thermal::None);
        };
        if !t.is_finite() || t < 0.0 {
            return Err(Error::InvalidParam("temperature must be finite and >= 0".into()));
        }
        Ok(match (randomness, multiplicative) {
            (true, _) => Thermal::Random { rate: t },
            (_, true) => Thermal::Multiplicative(t),
            _ => Thermal::Fixed(t),
        })
    }

    fn validate(self) -> Result<Self> {
        match self {
            Thermal::None => Ok(self),
            Thermal::Fixed(t) | Thermal::Multiplicative(t) if t.is_finite() && t >= 0.0 => Ok(self),
            Thermal::Random { rate } if rate.is_finite() && rate > 0.0 => Ok(self),
            _ => Err(Error::InvalidParam(format!("invalid thermal response {self:?}"))),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Thermal::None)
    }

    /// Target value for a rebound quantity whose current magnitude is `current`.
    ///
    /// Returns `None` for `Thermal::None`.
    pub fn target<R: Rng + ?Sized>(&self, current: f64, rng: &mut R) -> Option<f64> {
        match *self {
            Thermal::None => None,
            Thermal::Fixed(t) => Some(t),
            Thermal::Random { rate } => Some(exponential(rate, rng)),
            Thermal::Multiplicative(f) => Some(current * f),
        }
    }
}

/// Inverse-CDF draw from an exponential distribution with the given rate (mean `1 / rate`).
fn exponential<R: Rng + ?Sized>(rate: f64, rng: &mut R) -> f64 {
    let u: f64 = rng.random::<f64>();
    -(1.0 - u).ln() / rate
}

/// Identifier of a bumper within its engine (insertion order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BumperId(pub usize);

/// Identifier of an xline within its engine (insertion order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XLineId(pub usize);

/// Fixed circular obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct Bumper {
    position: Vec2,
    radius: f64,
    thermal: Thermal,
    cell: (usize, usize),
}

impl Bumper {
    /// Rigid bumper.
    pub fn new(position: Vec2, radius: f64) -> Result<Self> {
        Self::with_thermal(position, radius, Thermal::None)
    }

    pub fn with_thermal(position: Vec2, radius: f64, thermal: Thermal) -> Result<Self> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParam("bumper radius must be finite and >= 0".into()));
        }
        if !position.is_finite() {
            return Err(Error::InvalidParam("bumper position must be finite".into()));
        }
        Ok(Self {
            position,
            radius,
            thermal: thermal.validate()?,
            cell: (0, 0),
        })
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn thermal(&self) -> Thermal {
        self.thermal
    }

    #[inline]
    pub fn cell(&self) -> (usize, usize) {
        self.cell
    }

    pub(crate) fn set_cell(&mut self, cell: (usize, usize)) {
        self.cell = cell;
    }
}

/// Vertical wall at a fixed x-coordinate spanning the full height of the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct XLine {
    x: f64,
    thermal: Thermal,
    x_only: bool,
    cell: (usize, usize),
}

impl XLine {
    /// Rigid wall.
    pub fn new(x: f64) -> Result<Self> {
        Self::with_thermal(x, Thermal::None, false)
    }

    /// Wall with a thermal response. With `x_only`, single-atom bodies are reflected by
    /// rewriting only their x-velocity, keeping the y-velocity locked.
    pub fn with_thermal(x: f64, thermal: Thermal, x_only: bool) -> Result<Self> {
        if !x.is_finite() {
            return Err(Error::InvalidParam("xline position must be finite".into()));
        }
        Ok(Self {
            x,
            thermal: thermal.validate()?,
            x_only,
            cell: (0, 0),
        })
    }

    /// Flag-based constructor mirroring the scenario file fields.
    pub fn with_flags(
        x: f64,
        temperature: Option<f64>,
        randomness: bool,
        multiplicative: bool,
        x_only: bool,
    ) -> Result<Self> {
        Self::with_thermal(x, Thermal::from_flags(temperature, randomness, multiplicative)?, x_only)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn thermal(&self) -> Thermal {
        self.thermal
    }

    #[inline]
    pub fn x_only(&self) -> bool {
        self.x_only
    }

    #[inline]
    pub fn cell(&self) -> (usize, usize) {
        self.cell
    }

    pub(crate) fn set_cell(&mut self, cell: (usize, usize)) {
        self.cell = cell;
    }
}
