//! Simulation kernel: geometry, bodies, boundary elements, the spatial grid, event prediction
//! and resolution, and the engine that drives them.

pub mod body;
pub mod dispatch;
pub mod elasticity;
pub mod elements;
pub mod engine;
pub mod event;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod queue;
pub mod report;
pub mod roots;
pub mod space;

pub use body::{Atom, Body, BodyId, Tag};
pub use dispatch::{Dispatcher, Filter, Handle, Observable};
pub use elasticity::Elasticity;
pub use elements::{Bumper, BumperId, Thermal, XLine, XLineId};
pub use engine::Engine;
pub use event::{BodyRef, Event};
pub use events::{BumperHit, Collision, Crossing, XLineHit};
pub use geometry::{Fold, Vec2};
pub use grid::Grid;
pub use queue::EventQueue;
pub use report::{BumperReport, Change, CollisionReport, Motion, Participant, XLineReport};
pub use space::Space;
