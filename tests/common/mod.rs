#![allow(dead_code)]

use molsim::core::{Atom, Body, Engine, Filter, Observable, Vec2};
use molsim::error::Result;
use std::cell::RefCell;
use std::rc::Rc;

pub const EPS: f64 = 1e-9;

/// Single-atom body of unit mass.
pub fn ball(x: f64, y: f64, vx: f64, vy: f64, radius: f64) -> Result<Body> {
    Body::single(Vec2::new(x, y), Vec2::new(vx, vy), 1.0, radius)
}

/// Three unit-mass atoms of radius 0.05 stacked along y, 0.1 apart, centered at `(x, y)`.
pub fn rod(x: f64, y: f64, vx: f64, vy: f64) -> Result<Body> {
    let atoms = [0.0, 0.1, 0.2]
        .iter()
        .map(|&dy| Atom::new(Vec2::new(0.0, dy), 1.0, 0.05))
        .collect::<Result<Vec<_>>>()?;
    Body::new(atoms, Vec2::new(x, y), Vec2::new(vx, vy), 0.0, 0.0)
}

/// Subscribe to kind `K` and collect every report it receives.
pub fn record<K>(engine: &mut Engine, filter: Filter) -> Result<Rc<RefCell<Vec<K::Report>>>>
where
    K: Observable,
    K::Report: Clone,
{
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    engine.subscribe::<K>(filter, move |r: &K::Report| sink.borrow_mut().push(r.clone()))?;
    Ok(log)
}

/// Subscribe to kind `K` and count the reports it receives.
pub fn count<K: Observable>(engine: &mut Engine, filter: Filter) -> Result<Rc<RefCell<usize>>> {
    let n = Rc::new(RefCell::new(0));
    let sink = n.clone();
    engine.subscribe::<K>(filter, move |_: &K::Report| *sink.borrow_mut() += 1)?;
    Ok(n)
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}
