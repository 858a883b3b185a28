//! Configuration types for loading simulation scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]  – grid fineness, random seed and elasticity table
//! - [`BodyConfig`]    – initial state and tags for each body
//! - [`BumperConfig`]  – static circular obstacles
//! - [`XLineConfig`]   – vertical walls
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   fineness: 4
//!   seed: 42
//!   elasticity:
//!     global: 1.0
//!     tags: { 1: 0.5 }
//!     pairs:
//!       - tags: [1, 2]
//!         value: 0.8
//!
//! bodies:
//!   - atoms:
//!       - { position: [0.0, 0.0], mass: 1.0, radius: 0.05 }
//!     position: [0.2, 0.5]
//!     velocity: [1.0, 0.0]
//!     tags: [1]
//!
//! bumpers:
//!   - position: [0.8, 0.5]
//!     radius: 0.05
//!     thermal: { fixed: 2.0 }   # or none, { multiplicative: 0.9 }, { random: { rate: 3.0 } }
//!
//! xlines:
//!   - x: 0.5
//!     temperature: 1.0
//!     x_only: true
//! ```

use crate::core::body::{Atom, Body, BodyId, Tag};
use crate::core::elements::{Bumper, Thermal, XLine};
use crate::core::engine::Engine;
use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

fn default_fineness() -> usize {
    1
}

fn default_elasticity() -> f64 {
    1.0
}

/// Engine-level options.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_fineness")]
    pub fineness: usize, // cells per side of the toroidal grid
    #[serde(default)]
    pub seed: Option<u64>, // None -> entropy-seeded random source
    #[serde(default)]
    pub elasticity: ElasticityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fineness: default_fineness(),
            seed: None,
            elasticity: ElasticityConfig::default(),
        }
    }
}

/// Coefficients of restitution.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElasticityConfig {
    #[serde(default = "default_elasticity")]
    pub global: f64,
    #[serde(default)]
    pub tags: BTreeMap<Tag, f64>,
    #[serde(default)]
    pub pairs: Vec<PairElasticityConfig>,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            global: default_elasticity(),
            tags: BTreeMap::new(),
            pairs: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PairElasticityConfig {
    pub tags: (Tag, Tag),
    pub value: f64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomConfig {
    #[serde(default)]
    pub position: [f64; 2], // relative to the body frame, recentered on load
    pub mass: f64,
    pub radius: f64,
}

/// Initial state of one body.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub atoms: Vec<AtomConfig>,
    pub position: [f64; 2], // center of mass
    #[serde(default)]
    pub velocity: [f64; 2],
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub angular_velocity: f64,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl BodyConfig {
    pub fn to_body(&self) -> Result<Body> {
        let atoms = self
            .atoms
            .iter()
            .map(|a| Atom::new(a.position.into(), a.mass, a.radius))
            .collect::<Result<Vec<_>>>()?;
        Body::new(
            atoms,
            self.position.into(),
            self.velocity.into(),
            self.orientation,
            self.angular_velocity,
        )
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BumperConfig {
    pub position: [f64; 2],
    pub radius: f64,
    #[serde(default, deserialize_with = "serde_yaml::with::singleton_map::deserialize")]
    pub thermal: Thermal,
}

impl BumperConfig {
    pub fn to_bumper(&self) -> Result<Bumper> {
        Bumper::with_thermal(self.position.into(), self.radius, self.thermal)
    }
}

/// Vertical wall, described with the temperature flags.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct XLineConfig {
    pub x: f64,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub randomness: bool, // temperature is the rate of an exponential draw
    #[serde(default)]
    pub multiplicative: bool, // temperature is a rebound factor
    #[serde(default)]
    pub x_only: bool,
}

impl XLineConfig {
    pub fn to_xline(&self) -> Result<XLine> {
        XLine::with_flags(
            self.x,
            self.temperature,
            self.randomness,
            self.multiplicative,
            self.x_only,
        )
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub bumpers: Vec<BumperConfig>,
    #[serde(default)]
    pub xlines: Vec<XLineConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Build a ready engine: boundary elements first, then bodies with their tags.
    ///
    /// Returns the engine and the ids of the bodies in document order.
    pub fn build(&self) -> Result<(Engine, Vec<BodyId>)> {
        let mut engine = Engine::from_config(&self.engine)?;
        for b in &self.bumpers {
            engine.add_bumper(b.to_bumper()?)?;
        }
        for x in &self.xlines {
            engine.add_xline(x.to_xline()?)?;
        }
        let mut ids = Vec::with_capacity(self.bodies.len());
        for b in &self.bodies {
            let id = engine.add(b.to_body()?)?;
            for &tag in &b.tags {
                engine.tag(id, tag)?;
            }
            ids.push(id);
        }
        log::debug!(
            "built scenario with {} bodies, {} bumpers, {} xlines",
            ids.len(),
            self.bumpers.len(),
            self.xlines.len()
        );
        Ok((engine, ids))
    }
}
