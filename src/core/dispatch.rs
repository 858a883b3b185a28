//! Tag-filtered subscriptions to resolved interactions.
//!
//! Each observable event kind has its own registry. A trigger first runs every unfiltered
//! subscriber in registration order, then every filtered subscriber whose filter matches.

use crate::core::body::Tag;
use crate::core::events::{BumperHit, Collision, XLineHit};
use crate::core::report::{BumperReport, CollisionReport, Participant, XLineReport};
use crate::error::{Error, Result};
use std::fmt;

/// Subscription handle, unique per dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

/// Which interactions a subscriber wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Any participant carries the tag.
    Tag(Tag),
    /// Body-body collisions between a body carrying the first tag and one carrying the second,
    /// in either order. The tags must differ.
    Pair(Tag, Tag),
}

impl Filter {
    fn matches(self, first: &Participant, second: Option<&Participant>) -> bool {
        match self {
            Filter::All => true,
            Filter::Tag(t) => first.has_tag(t) || second.is_some_and(|p| p.has_tag(t)),
            Filter::Pair(a, b) => second.is_some_and(|second| {
                (first.has_tag(a) && second.has_tag(b)) || (first.has_tag(b) && second.has_tag(a))
            }),
        }
    }
}

pub type Callback<R> = Box<dyn FnMut(&R)>;

struct Subscriber<R> {
    handle: Handle,
    filter: Filter,
    callback: Callback<R>,
}

/// Subscribers for one event kind.
pub struct Registry<R> {
    subscribers: Vec<Subscriber<R>>,
}

impl<R> Default for Registry<R> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<R> fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<R> Registry<R> {
    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    fn trigger(&mut self, report: &R, first: &Participant, second: Option<&Participant>) {
        for s in self.subscribers.iter_mut().filter(|s| s.filter == Filter::All) {
            (s.callback)(report);
        }
        for s in self
            .subscribers
            .iter_mut()
            .filter(|s| s.filter != Filter::All && s.filter.matches(first, second))
        {
            (s.callback)(report);
        }
    }
}

/// An event kind subscribers can listen to.
pub trait Observable {
    type Report: 'static;

    /// Whether pair filters make sense for this kind.
    const PAIRS: bool;

    fn registry(dispatcher: &mut Dispatcher) -> &mut Registry<Self::Report>;

    fn participants(report: &Self::Report) -> (&Participant, Option<&Participant>);
}

impl Observable for Collision {
    type Report = CollisionReport;
    const PAIRS: bool = true;

    fn registry(dispatcher: &mut Dispatcher) -> &mut Registry<CollisionReport> {
        &mut dispatcher.collisions
    }

    fn participants(report: &CollisionReport) -> (&Participant, Option<&Participant>) {
        (&report.alpha, Some(&report.beta))
    }
}

impl Observable for BumperHit {
    type Report = BumperReport;
    const PAIRS: bool = false;

    fn registry(dispatcher: &mut Dispatcher) -> &mut Registry<BumperReport> {
        &mut dispatcher.bumpers
    }

    fn participants(report: &BumperReport) -> (&Participant, Option<&Participant>) {
        (&report.body, None)
    }
}

impl Observable for XLineHit {
    type Report = XLineReport;
    const PAIRS: bool = false;

    fn registry(dispatcher: &mut Dispatcher) -> &mut Registry<XLineReport> {
        &mut dispatcher.xlines
    }

    fn participants(report: &XLineReport) -> (&Participant, Option<&Participant>) {
        (&report.body, None)
    }
}

/// Per-kind subscription registries.
#[derive(Debug, Default)]
pub struct Dispatcher {
    next: u64,
    collisions: Registry<CollisionReport>,
    bumpers: Registry<BumperReport>,
    xlines: Registry<XLineReport>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of kind `K` passing `filter`.
    ///
    /// Errors: `InvalidParam` for a pair filter on a kind without pairs, or a pair of equal
    /// tags.
    pub fn subscribe<K: Observable>(
        &mut self,
        filter: Filter,
        callback: impl FnMut(&K::Report) + 'static,
    ) -> Result<Handle> {
        if let Filter::Pair(a, b) = filter {
            if !K::PAIRS {
                return Err(Error::InvalidParam(
                    "pair filters only apply to body-body collisions".into(),
                ));
            }
            if a == b {
                return Err(Error::InvalidParam(format!(
                    "pair filter needs two distinct tags, got ({a}, {b})"
                )));
            }
        }
        self.next += 1;
        let handle = Handle(self.next);
        K::registry(self).subscribers.push(Subscriber {
            handle,
            filter,
            callback: Box::new(callback),
        });
        Ok(handle)
    }

    /// Drop the subscription `handle` from the registry of kind `K`.
    pub fn unsubscribe<K: Observable>(&mut self, handle: Handle) -> Result<()> {
        let registry = K::registry(self);
        let idx = registry
            .subscribers
            .iter()
            .position(|s| s.handle == handle)
            .ok_or(Error::UnknownHandle(handle))?;
        registry.subscribers.remove(idx);
        Ok(())
    }

    /// Whether anyone listens to kind `K`.
    pub fn wants<K: Observable>(&mut self) -> bool {
        !K::registry(self).is_empty()
    }

    pub fn trigger<K: Observable>(&mut self, report: &K::Report) {
        let (first, second) = K::participants(report);
        K::registry(self).trigger(report, first, second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyId;
    use crate::core::elements::Bumper;
    use crate::core::geometry::Vec2;
    use crate::core::report::Motion;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn participant(id: u64, tags: &[Tag]) -> Participant {
        Participant {
            id: BodyId(id),
            tags: tags.to_vec(),
            atom: 0,
            mass: 1.0,
            inertia: 1.0,
            position: Vec2::ZERO,
            orientation: 0.0,
            before: Motion::default(),
            after: Motion::default(),
        }
    }

    fn collision(a: &[Tag], b: &[Tag]) -> CollisionReport {
        CollisionReport {
            time: 1.0,
            module: 0.0,
            elasticity: 1.0,
            alpha: participant(1, a),
            beta: participant(2, b),
        }
    }

    #[test]
    fn unfiltered_subscribers_run_first() -> Result<()> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut d = Dispatcher::new();
        let l = log.clone();
        d.subscribe::<Collision>(Filter::Tag(1), move |_| l.borrow_mut().push("tag"))?;
        let l = log.clone();
        d.subscribe::<Collision>(Filter::All, move |_| l.borrow_mut().push("all"))?;
        d.trigger::<Collision>(&collision(&[1], &[]));
        assert_eq!(*log.borrow(), vec!["all", "tag"]);
        Ok(())
    }

    #[test]
    fn pair_filter_matches_either_order() -> Result<()> {
        let hits = Rc::new(RefCell::new(0));
        let mut d = Dispatcher::new();
        let h = hits.clone();
        d.subscribe::<Collision>(Filter::Pair(1, 2), move |_| *h.borrow_mut() += 1)?;
        d.trigger::<Collision>(&collision(&[1], &[2]));
        d.trigger::<Collision>(&collision(&[2], &[1]));
        d.trigger::<Collision>(&collision(&[1], &[1]));
        d.trigger::<Collision>(&collision(&[2], &[3]));
        assert_eq!(*hits.borrow(), 2);
        Ok(())
    }

    #[test]
    fn invalid_pair_filters_rejected() {
        let mut d = Dispatcher::new();
        assert!(d.subscribe::<Collision>(Filter::Pair(1, 1), |_| {}).is_err());
        assert!(d.subscribe::<BumperHit>(Filter::Pair(1, 2), |_| {}).is_err());
    }

    #[test]
    fn unsubscribe_is_per_kind() -> Result<()> {
        let mut d = Dispatcher::new();
        let h = d.subscribe::<BumperHit>(Filter::Tag(4), |_| {})?;
        assert!(matches!(
            d.unsubscribe::<Collision>(h),
            Err(Error::UnknownHandle(_))
        ));
        assert!(d.wants::<BumperHit>());
        d.unsubscribe::<BumperHit>(h)?;
        assert!(!d.wants::<BumperHit>());
        assert!(d.unsubscribe::<BumperHit>(h).is_err());
        Ok(())
    }

    #[test]
    fn bumper_tag_filter() -> Result<()> {
        let hits = Rc::new(RefCell::new(0));
        let mut d = Dispatcher::new();
        let h = hits.clone();
        d.subscribe::<BumperHit>(Filter::Tag(7), move |_| *h.borrow_mut() += 1)?;
        let report = |tags: &[Tag]| BumperReport {
            time: 0.0,
            module: 0.0,
            body: participant(1, tags),
            bumper: Bumper::new(Vec2::new(0.5, 0.5), 0.1).unwrap(),
        };
        d.trigger::<BumperHit>(&report(&[7]));
        d.trigger::<BumperHit>(&report(&[6]));
        assert_eq!(*hits.borrow(), 1);
        Ok(())
    }
}
