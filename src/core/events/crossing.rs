use crate::core::body::Body;
use crate::core::event::BodyRef;
use crate::core::geometry::Fold;
use crate::core::grid::Grid;
use crate::core::space::{missing, Space};
use crate::error::{Error, Result};

/// Fraction of a cell a body must travel past a boundary before it is re-homed.
const CONTOUR: f64 = 0.01;

/// A body leaving its grid cell.
#[derive(Debug, Clone)]
pub struct Crossing {
    time: f64,
    body: BodyRef,
    direction: Fold,
}

impl Crossing {
    #[cfg(test)]
    pub(crate) fn at(time: f64, body: BodyRef, direction: Fold) -> Self {
        Self {
            time,
            body,
            direction,
        }
    }

    /// Predict when `body` (stored under `key`) exits its cell, overshooting the boundary by
    /// a small contour.
    ///
    /// Errors: `Error::Invariant` if the body already lies outside its cell.
    pub fn predict(key: usize, body: &Body, grid: &Grid) -> Result<Option<Self>> {
        let step = grid.step();
        let contour = CONTOUR * step;
        if !grid.contains(body, contour) {
            return Err(Error::invariant(format!(
                "body {} at {:?} is outside its cell {:?}",
                body.id(),
                body.position(),
                body.cell()
            )));
        }

        let (cx, cy) = body.cell();
        let p = body.position();
        let v = body.velocity();
        let exit = |cell: usize, p: f64, v: f64| {
            let (edge, sign) = if v >= 0.0 { (cell + 1, 1.0) } else { (cell, -1.0) };
            let t = (step * edge as f64 + contour * sign - p) / v;
            if t.is_finite() {
                t
            } else {
                f64::INFINITY
            }
        };
        let (tx, ty) = (exit(cx, p.x, v.x), exit(cy, p.y, v.y));
        if tx.is_infinite() && ty.is_infinite() {
            return Ok(None);
        }

        let (dt, direction) = if tx < ty {
            (tx, if v.x >= 0.0 { Fold::RIGHT } else { Fold::LEFT })
        } else {
            (ty, if v.y >= 0.0 { Fold::UP } else { Fold::DOWN })
        };
        Ok(Some(Self {
            time: body.time() + dt,
            body: BodyRef::new(key, body.version()),
            direction,
        }))
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn body(&self) -> BodyRef {
        self.body
    }

    /// Direction of travel across the boundary.
    #[inline]
    pub fn direction(&self) -> Fold {
        self.direction
    }

    pub(crate) fn resolve(&mut self, space: &mut Space) -> Result<bool> {
        if !space.is_current(self.body) {
            return Ok(false);
        }
        let key = self.body.key;
        let body = space.bodies.get_mut(key).ok_or_else(|| missing(key))?;
        body.bump_version();
        body.integrate(self.time);
        space.grid.relocate(key, body, self.direction)?;
        Ok(true)
    }
}
