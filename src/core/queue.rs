use crate::core::event::{Event, Scheduled};
use crate::error::Result;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Min-heap of pending events keyed by time, first-in first-out among equal times.
///
/// Stale entries are not removed eagerly; they are discarded when popped.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors: `Error::Invariant` if the event's time is NaN.
    pub fn push(&mut self, event: Event) -> Result<()> {
        let entry = Scheduled::new(event, self.seq)?;
        self.seq += 1;
        self.heap.push(Reverse(entry));
        Ok(())
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(s)| s.time.into_inner())
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(s)| s.event)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
