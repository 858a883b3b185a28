use crate::core::dispatch::Dispatcher;
use crate::core::events::{BumperHit, Collision, Crossing, XLineHit};
use crate::core::space::Space;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Reference to a body held by a pending event, tagged with the version the prediction was
/// computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRef {
    pub(crate) key: usize,
    pub(crate) version: u64,
}

impl BodyRef {
    #[inline]
    pub(crate) fn new(key: usize, version: u64) -> Self {
        Self { key, version }
    }
}

/// A predicted interaction. One variant per kind.
#[derive(Debug, Clone)]
pub enum Event {
    /// A body leaves its grid cell.
    Crossing(Crossing),
    /// Two bodies collide.
    Collision(Collision),
    /// A body hits a bumper.
    Bumper(BumperHit),
    /// A body hits an xline.
    XLine(XLineHit),
}

impl Event {
    /// Absolute occurrence time.
    pub fn time(&self) -> f64 {
        match self {
            Event::Crossing(e) => e.time(),
            Event::Collision(e) => e.time(),
            Event::Bumper(e) => e.time(),
            Event::XLine(e) => e.time(),
        }
    }

    /// Bodies referenced by the event, in participant order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyRef> {
        let refs = match self {
            Event::Crossing(e) => [Some(e.body()), None],
            Event::Collision(e) => [Some(e.alpha()), Some(e.beta())],
            Event::Bumper(e) => [Some(e.body()), None],
            Event::XLine(e) => [Some(e.body()), None],
        };
        refs.into_iter().flatten()
    }

    /// True iff every referenced body still has the version the prediction was made from.
    pub fn current(&self, space: &Space) -> bool {
        self.bodies().all(|r| space.is_current(r))
    }

    /// Apply the event to the bodies it references.
    ///
    /// Returns `Ok(false)` without side effects when the prediction is stale.
    pub fn resolve(&mut self, space: &mut Space) -> Result<bool> {
        match self {
            Event::Crossing(e) => e.resolve(space),
            Event::Collision(e) => e.resolve(space),
            Event::Bumper(e) => e.resolve(space),
            Event::XLine(e) => e.resolve(space),
        }
    }

    /// Hand a report of the resolved event to the matching subscribers.
    pub fn notify(&self, dispatcher: &mut Dispatcher, space: &Space) {
        match self {
            Event::Crossing(_) => {}
            Event::Collision(e) => e.notify(dispatcher, space),
            Event::Bumper(e) => e.notify(dispatcher, space),
            Event::XLine(e) => e.notify(dispatcher, space),
        }
    }
}

/// Queue entry: an event keyed by time, ties broken by insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Scheduled {
    pub(crate) time: NotNan<f64>,
    pub(crate) seq: u64,
    pub(crate) event: Event,
}

impl Scheduled {
    /// Wrap an event for queueing.
    ///
    /// Errors: `Error::Invariant` if the event will happen but its time is NaN.
    pub(crate) fn new(event: Event, seq: u64) -> Result<Self> {
        let time = NotNan::new(event.time())
            .map_err(|_| Error::invariant(format!("event {event:?} will happen at a NaN time")))?;
        Ok(Self { time, seq, event })
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            o => o,
        }
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
