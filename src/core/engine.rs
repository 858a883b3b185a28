use crate::config::EngineConfig;
use crate::core::body::{Body, BodyId, Tag};
use crate::core::dispatch::{Dispatcher, Filter, Handle, Observable};
use crate::core::elasticity::Elasticity;
use crate::core::elements::{Bumper, BumperId, XLine, XLineId};
use crate::core::event::Event;
use crate::core::events::{BumperHit, Collision, Crossing, XLineHit};
use crate::core::geometry::Fold;
use crate::core::grid::Grid;
use crate::core::queue::EventQueue;
use crate::core::space::{missing, Space};
use crate::error::{Error, Result};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

/// Discrete-event engine for rigid multi-atom bodies on the unit torus.
///
/// Bodies move on straight lines while spinning at constant rate between events. The engine
/// predicts every grid crossing and every contact with nearby bodies, bumpers and xlines,
/// keeps the predictions in a time-ordered queue, and resolves them in order. Predictions are
/// invalidated lazily: each carries the versions of the bodies it was computed from and is
/// dropped on pop if any of them changed since.
#[derive(Debug)]
pub struct Engine {
    time: f64,
    space: Space,
    queue: EventQueue,
    dispatcher: Dispatcher,
    elasticity: Elasticity,
    live: BTreeMap<BodyId, usize>,
    tagged: BTreeMap<Tag, BTreeSet<BodyId>>,
    garbage: Vec<usize>,
    next_id: u64,
}

impl Engine {
    /// Engine over a `fineness × fineness` grid with an entropy-seeded random source.
    pub fn new(fineness: usize) -> Result<Self> {
        Self::with_seed(fineness, None)
    }

    pub fn with_seed(fineness: usize, seed: Option<u64>) -> Result<Self> {
        let rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        Ok(Self {
            time: 0.0,
            space: Space::new(Grid::new(fineness)?, rng),
            queue: EventQueue::new(),
            dispatcher: Dispatcher::new(),
            elasticity: Elasticity::default(),
            live: BTreeMap::new(),
            tagged: BTreeMap::new(),
            garbage: Vec::new(),
            next_id: 1,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut engine = Self::with_seed(config.fineness, config.seed)?;
        let e = &config.elasticity;
        engine.elasticity.set_global(e.global)?;
        for (&tag, &value) in &e.tags {
            engine.elasticity.set_tag(tag, value)?;
        }
        for p in &e.pairs {
            engine.elasticity.set_pair(p.tags.0, p.tags.1, p.value)?;
        }
        Ok(engine)
    }

    // ============ Accessors ============

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn fineness(&self) -> usize {
        self.space.grid.fineness()
    }

    /// Number of queued predictions, stale ones included.
    #[inline]
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Number of live bodies.
    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live body `id`, as of its last integration.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.live.get(&id).and_then(|&key| self.space.bodies.get(key))
    }

    pub fn bumpers(&self) -> &[Bumper] {
        &self.space.bumpers
    }

    pub fn xlines(&self) -> &[XLine] {
        &self.space.xlines
    }

    #[inline]
    pub fn elasticity(&self) -> &Elasticity {
        &self.elasticity
    }

    // ============ Population ============

    /// Insert `body` at the current time and predict its events.
    pub fn add(&mut self, mut body: Body) -> Result<BodyId> {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        body.reset_bookkeeping(id, self.time);

        let key = self.space.bodies.insert(body);
        let body = &mut self.space.bodies[key];
        if let Err(e) = self.space.grid.insert_body(key, body) {
            self.space.bodies.remove(key);
            return Err(e);
        }
        self.live.insert(id, key);
        log::debug!("added body {id} at {:?} (t={})", body.position(), self.time);
        self.refresh(key, None)?;
        Ok(id)
    }

    /// Insert a bumper and re-predict the bodies around it.
    pub fn add_bumper(&mut self, mut bumper: Bumper) -> Result<BumperId> {
        let id = BumperId(self.space.bumpers.len());
        self.space.grid.insert_bumper(id, &mut bumper)?;
        let cell = bumper.cell();
        log::debug!("added bumper {id:?} at {:?}", bumper.position());
        self.space.bumpers.push(bumper);

        let grid = &self.space.grid;
        let keys: BTreeSet<usize> = grid
            .neighbors(cell)
            .into_iter()
            .flat_map(|(x, y, _)| grid.bodies(x, y))
            .collect();
        for key in keys {
            self.invalidate(key)?;
        }
        Ok(id)
    }

    /// Insert an xline and re-predict the bodies in the columns around it.
    pub fn add_xline(&mut self, mut xline: XLine) -> Result<XLineId> {
        let id = XLineId(self.space.xlines.len());
        self.space.grid.insert_xline(id, &mut xline)?;
        let column = xline.cell().0;
        log::debug!("added xline {id:?} at x={}", xline.x());
        self.space.xlines.push(xline);

        let grid = &self.space.grid;
        let keys: BTreeSet<usize> = grid
            .neighbor_columns(column)
            .into_iter()
            .flat_map(|(x, _)| (0..grid.fineness()).flat_map(move |y| grid.bodies(x, y)))
            .collect();
        for key in keys {
            self.invalidate(key)?;
        }
        Ok(id)
    }

    /// Take body `id` out of the simulation.
    ///
    /// Pending events that reference it become stale; its storage is reclaimed once none of
    /// them is left in the queue.
    pub fn remove(&mut self, id: BodyId) -> Result<()> {
        let key = self.live.remove(&id).ok_or(Error::UnknownBody(id))?;
        let body = self.space.body_mut(key)?;
        let tags: Vec<Tag> = body.tags().collect();
        body.disable();
        self.space.grid.remove_body(key, &self.space.bodies[key]);
        for tag in tags {
            self.unindex(tag, id);
        }
        self.garbage.push(key);
        log::debug!("removed body {id}");
        Ok(())
    }

    /// Free removed bodies that no pending event refers to anymore.
    pub fn collect(&mut self) {
        let bodies = &mut self.space.bodies;
        let before = self.garbage.len();
        self.garbage.retain(|&key| match bodies.get(key) {
            Some(b) if b.references() == 0 => {
                bodies.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        });
        let freed = before - self.garbage.len();
        if freed > 0 {
            log::debug!("freed {freed} bodies, {} still referenced", self.garbage.len());
        }
    }

    // ============ Tags and elasticity ============

    pub fn tag(&mut self, id: BodyId, tag: Tag) -> Result<()> {
        let key = self.key(id)?;
        if self.space.body_mut(key)?.add_tag(tag) {
            self.tagged.entry(tag).or_default().insert(id);
            self.invalidate(key)?;
        }
        Ok(())
    }

    pub fn untag(&mut self, id: BodyId, tag: Tag) -> Result<()> {
        let key = self.key(id)?;
        if self.space.body_mut(key)?.remove_tag(tag) {
            self.unindex(tag, id);
            self.invalidate(key)?;
        }
        Ok(())
    }

    /// Set the global coefficient of restitution.
    pub fn set_elasticity(&mut self, value: f64) -> Result<()> {
        self.elasticity.set_global(value)?;
        log::debug!("global elasticity set to {value}");
        self.invalidate_all()
    }

    /// Set the coefficient used when exactly one body carries exactly the tag `tag`.
    pub fn set_tag_elasticity(&mut self, tag: Tag, value: f64) -> Result<()> {
        self.elasticity.set_tag(tag, value)?;
        log::debug!("elasticity for tag {tag} set to {value}");
        self.invalidate_all()
    }

    /// Set the coefficient used between a body tagged `a` and a body tagged `b`.
    pub fn set_pair_elasticity(&mut self, a: Tag, b: Tag, value: f64) -> Result<()> {
        self.elasticity.set_pair(a, b, value)?;
        log::debug!("elasticity for tags ({a}, {b}) set to {value}");
        self.invalidate_all()
    }

    // ============ Energy ============

    /// Rescale every live body's kinetic energy to `energy`.
    pub fn reset_energy(&mut self, energy: f64) -> Result<()> {
        let keys: Vec<usize> = self.live.values().copied().collect();
        self.rescale(keys, energy)
    }

    /// Rescale the kinetic energy of the bodies tagged `tag` to `energy`.
    pub fn reset_energy_tagged(&mut self, tag: Tag, energy: f64) -> Result<()> {
        let keys: Vec<usize> = self
            .tagged
            .get(&tag)
            .into_iter()
            .flatten()
            .filter_map(|id| self.live.get(id).copied())
            .collect();
        self.rescale(keys, energy)
    }

    fn rescale(&mut self, keys: Vec<usize>, energy: f64) -> Result<()> {
        if !energy.is_finite() || energy < 0.0 {
            return Err(Error::InvalidParam(format!(
                "energy must be finite and >= 0, got {energy}"
            )));
        }
        for key in keys {
            let time = self.time;
            let body = self.space.body_mut(key)?;
            body.integrate(time);
            body.scale_energy(energy);
            self.invalidate(key)?;
        }
        Ok(())
    }

    // ============ Traversal and subscriptions ============

    /// Visit every live body in id order, integrated to the current time.
    pub fn each(&mut self, mut visit: impl FnMut(&Body)) {
        for &key in self.live.values() {
            if let Some(body) = self.space.bodies.get_mut(key) {
                body.integrate(self.time);
                visit(body);
            }
        }
    }

    /// Visit the live bodies tagged `tag` in id order, integrated to the current time.
    pub fn each_tagged(&mut self, tag: Tag, mut visit: impl FnMut(&Body)) {
        let Some(ids) = self.tagged.get(&tag) else {
            return;
        };
        for id in ids {
            let Some(&key) = self.live.get(id) else {
                continue;
            };
            if let Some(body) = self.space.bodies.get_mut(key) {
                body.integrate(self.time);
                visit(body);
            }
        }
    }

    /// Register `callback` for resolved events of kind `K` (`Collision`, `BumperHit` or
    /// `XLineHit`).
    pub fn subscribe<K: Observable>(
        &mut self,
        filter: Filter,
        callback: impl FnMut(&K::Report) + 'static,
    ) -> Result<Handle> {
        self.dispatcher.subscribe::<K>(filter, callback)
    }

    pub fn unsubscribe<K: Observable>(&mut self, handle: Handle) -> Result<()> {
        self.dispatcher.unsubscribe::<K>(handle)
    }

    // ============ Event loop ============

    /// Resolve every pending event up to and including `until`, then bring all bodies to
    /// `until`.
    ///
    /// Errors: `InvalidParam` if `until` is not finite; `Invariant` if the simulation state
    /// got corrupted, after which the engine must not be driven further.
    pub fn run(&mut self, until: f64) -> Result<()> {
        if !until.is_finite() {
            return Err(Error::InvalidParam(format!("run target must be finite, got {until}")));
        }

        while let Some(t) = self.queue.peek_time() {
            if t > until {
                break;
            }
            let Some(mut event) = self.queue.pop() else {
                break;
            };
            for r in event.bodies() {
                if let Some(body) = self.space.bodies.get_mut(r.key) {
                    body.decref();
                }
            }
            if !event.resolve(&mut self.space)? {
                continue;
            }

            let keys: Vec<usize> = event.bodies().map(|r| r.key).collect();
            for (i, &key) in keys.iter().enumerate() {
                let skip = i.checked_sub(1).map(|j| keys[j]);
                self.refresh(key, skip)?;
            }
            event.notify(&mut self.dispatcher, &self.space);
        }

        self.time = self.time.max(until);
        let keys: Vec<usize> = self.live.values().copied().collect();
        for key in keys {
            self.space.body_mut(key)?.integrate(self.time);
            // Queued folds were computed against the old cell.
            if self.ensure_cell(key)? {
                self.invalidate(key)?;
            }
        }
        self.collect();
        Ok(())
    }

    // ============ Internal helpers ============

    fn key(&self, id: BodyId) -> Result<usize> {
        self.live.get(&id).copied().ok_or(Error::UnknownBody(id))
    }

    fn unindex(&mut self, tag: Tag, id: BodyId) {
        if let Some(ids) = self.tagged.get_mut(&tag) {
            ids.remove(&id);
            if ids.is_empty() {
                self.tagged.remove(&tag);
            }
        }
    }

    /// Re-home the body if it drifted out of its cell. Returns whether it moved.
    fn ensure_cell(&mut self, key: usize) -> Result<bool> {
        let body = self.space.bodies.get_mut(key).ok_or_else(|| missing(key))?;
        if self.space.grid.contains(body, 0.0) {
            return Ok(false);
        }
        self.space.grid.relocate(key, body, Fold::DIRECT)?;
        Ok(true)
    }

    /// Drop the body's pending predictions and compute fresh ones.
    fn invalidate(&mut self, key: usize) -> Result<()> {
        self.space.body_mut(key)?.bump_version();
        self.refresh(key, None)
    }

    fn invalidate_all(&mut self) -> Result<()> {
        let keys: Vec<usize> = self.live.values().copied().collect();
        for key in keys {
            self.invalidate(key)?;
        }
        Ok(())
    }

    /// Predict every event the body at `key` takes part in, ignoring the body at `skip`.
    fn refresh(&mut self, key: usize, skip: Option<usize>) -> Result<()> {
        // Callers bump the version first, so moving cells here leaves nothing stale behind.
        self.ensure_cell(key)?;
        let space = &self.space;
        let grid = &space.grid;
        let body = space.body(key)?;

        let mut predicted = Vec::new();
        if let Some(c) = Crossing::predict(key, body, grid)? {
            predicted.push(Event::Crossing(c));
        }

        let (column, _) = body.cell();
        for (x, fold) in grid.neighbor_columns(column) {
            for id in grid.xlines(x) {
                if let Some(e) = XLineHit::predict(key, body, fold, id, &space.xlines[id.0]) {
                    predicted.push(Event::XLine(e));
                }
            }
        }

        for (x, y, fold) in grid.neighbors(body.cell()) {
            for other in grid.bodies(x, y) {
                if other == key || Some(other) == skip {
                    continue;
                }
                let beta = space.body(other)?;
                let e = self.elasticity.resolve(body, beta);
                if let Some(c) = Collision::predict(key, body, fold, other, beta, e) {
                    predicted.push(Event::Collision(c));
                }
            }
            for id in grid.bumpers(x, y) {
                if let Some(e) = BumperHit::predict(key, body, fold, id, &space.bumpers[id.0]) {
                    predicted.push(Event::Bumper(e));
                }
            }
        }

        for event in predicted {
            for r in event.bodies() {
                self.space.body_mut(r.key)?.incref();
            }
            self.queue.push(event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Vec2;

    fn ball(x: f64, y: f64, vx: f64, vy: f64) -> Body {
        Body::single(Vec2::new(x, y), Vec2::new(vx, vy), 1.0, 0.05).unwrap()
    }

    #[test]
    fn ids_are_per_engine() -> Result<()> {
        let mut a = Engine::with_seed(2, Some(1))?;
        let mut b = Engine::with_seed(2, Some(1))?;
        assert_eq!(a.add(ball(0.2, 0.2, 0.0, 0.0))?, BodyId(1));
        assert_eq!(a.add(ball(0.7, 0.7, 0.0, 0.0))?, BodyId(2));
        assert_eq!(b.add(ball(0.2, 0.2, 0.0, 0.0))?, BodyId(1));
        Ok(())
    }

    #[test]
    fn non_finite_target_rejected() -> Result<()> {
        let mut e = Engine::new(1)?;
        assert!(matches!(e.run(f64::NAN), Err(Error::InvalidParam(_))));
        assert!(e.run(f64::INFINITY).is_err());
        Ok(())
    }

    #[test]
    fn references_track_queued_predictions() -> Result<()> {
        let mut e = Engine::with_seed(1, Some(3))?;
        let a = e.add(ball(0.2, 0.5, 1.0, 0.0))?;
        let b = e.add(ball(0.8, 0.5, -1.0, 0.0))?;
        // Every queued prediction holds one reference per body it mentions.
        let refs: usize = [a, b].iter().map(|&id| e.body(id).map_or(0, Body::references)).sum();
        assert!(refs >= e.pending_events());
        e.run(0.3)?;
        assert_eq!(e.time(), 0.3);
        Ok(())
    }

    #[test]
    fn removed_body_is_freed_once_unreferenced() -> Result<()> {
        let mut e = Engine::with_seed(1, Some(3))?;
        let a = e.add(ball(0.2, 0.5, 1.0, 0.0))?;
        e.add(ball(0.8, 0.5, -1.0, 0.0))?;
        e.remove(a)?;
        assert!(e.body(a).is_none());
        assert_eq!(e.len(), 1);
        // Still referenced by queued predictions.
        e.collect();
        assert_eq!(e.garbage.len(), 1);
        e.run(10.0)?;
        assert!(e.garbage.is_empty());
        assert!(matches!(e.remove(a), Err(Error::UnknownBody(_))));
        Ok(())
    }

    #[test]
    fn new_bumper_invalidates_each_body_once() -> Result<()> {
        let mut e = Engine::with_seed(1, Some(0))?;
        e.add(ball(0.2, 0.2, 0.0, 0.0))?;
        e.add(ball(0.7, 0.7, 0.0, 0.0))?;
        let before = e.pending_events();
        e.add_bumper(Bumper::new(Vec2::new(0.5, 0.5), 0.01)?)?;
        // Each resting body was refreshed once: no new crossings and no predicted hits.
        assert_eq!(e.pending_events(), before);
        let versions: Vec<u64> = e.live.values().map(|&k| e.space.bodies[k].version()).collect();
        assert_eq!(versions, vec![1, 1]);
        Ok(())
    }

    #[test]
    fn tag_index_follows_tag_and_untag() -> Result<()> {
        let mut e = Engine::with_seed(2, Some(0))?;
        let a = e.add(ball(0.2, 0.2, 0.0, 0.0))?;
        e.tag(a, 4)?;
        let mut seen = Vec::new();
        e.each_tagged(4, |b| seen.push(b.id()));
        assert_eq!(seen, vec![a]);
        e.untag(a, 4)?;
        seen.clear();
        e.each_tagged(4, |b| seen.push(b.id()));
        assert!(seen.is_empty());
        assert!(e.tag(BodyId(99), 1).is_err());
        Ok(())
    }
}
