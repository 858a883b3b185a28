//! Discrete-event simulation of rigid multi-atom bodies on a periodic unit square.
//!
//! Bodies are built from circular atoms, move on straight lines while spinning at a constant
//! rate, and interact only at predicted instants: grid crossings, body-body collisions and
//! collisions with static bumpers and vertical xlines. See [`Engine`] for the entry point and
//! [`config::ScenarioConfig`] for loading scenarios from YAML.

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::{
    Atom, Body, BodyId, Bumper, BumperHit, BumperReport, Collision, CollisionReport, Engine,
    Filter, Handle, Participant, Tag, Thermal, Vec2, XLine, XLineHit, XLineReport,
};
pub use crate::error::{Error, Result};
