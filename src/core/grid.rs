//! Toroidal spatial grid over the unit square.
//!
//! Every cell keeps the slab keys of the bodies, and the ids of the bumpers and xlines, whose
//! reference point falls inside it. xlines are indexed only in the `y = 0` row of their column
//! even though they span the whole height; lookups walk that row.

use crate::core::body::Body;
use crate::core::elements::{Bumper, BumperId, XLine, XLineId};
use crate::core::geometry::{Fold, Vec2};
use crate::error::{Error, Result};
use std::collections::BTreeSet;

#[derive(Debug, Default, Clone)]
struct Cell {
    bodies: BTreeSet<usize>,
    bumpers: BTreeSet<usize>,
    xlines: BTreeSet<usize>,
}

/// `fineness × fineness` array of cells covering `[0, 1)²` with periodic boundaries.
#[derive(Debug, Clone)]
pub struct Grid {
    fineness: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(fineness: usize) -> Result<Self> {
        if fineness == 0 {
            return Err(Error::InvalidParam("grid fineness must be >= 1".into()));
        }
        Ok(Self {
            fineness,
            cells: vec![Cell::default(); fineness * fineness],
        })
    }

    #[inline]
    pub fn fineness(&self) -> usize {
        self.fineness
    }

    /// Edge length of one cell.
    #[inline]
    pub fn step(&self) -> f64 {
        1.0 / self.fineness as f64
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        x * self.fineness + y
    }

    /// Cell containing `p`, or `None` if `p` lies outside `[0, 1)²`.
    pub fn cell_of(&self, p: Vec2) -> Option<(usize, usize)> {
        let n = self.fineness as f64;
        let (cx, cy) = ((p.x * n).trunc(), (p.y * n).trunc());
        if p.x >= 0.0 && p.y >= 0.0 && cx < n && cy < n {
            Some((cx as usize, cy as usize))
        } else {
            None
        }
    }

    /// Whether `body`'s position lies within its recorded cell, bounds widened by `tolerance`.
    pub fn contains(&self, body: &Body, tolerance: f64) -> bool {
        let step = self.step();
        let (cx, cy) = body.cell();
        let p = body.position();
        p.x >= step * cx as f64 - tolerance
            && p.y >= step * cy as f64 - tolerance
            && p.x <= step * (cx + 1) as f64 + tolerance
            && p.y <= step * (cy + 1) as f64 + tolerance
    }

    // ============ Bodies ============

    /// Index a body under the cell of its position, folding it into the unit square first.
    pub(crate) fn insert_body(&mut self, key: usize, body: &mut Body) -> Result<()> {
        wrap_into_unit_square(body)?;
        let cell = self.cell_of(body.position()).ok_or_else(|| escaped(body))?;
        body.set_cell(cell);
        let idx = self.index(cell.0, cell.1);
        self.cells[idx].bodies.insert(key);
        Ok(())
    }

    pub(crate) fn remove_body(&mut self, key: usize, body: &Body) {
        let (x, y) = body.cell();
        let idx = self.index(x, y);
        self.cells[idx].bodies.remove(&key);
    }

    /// Re-home a body after it crossed a cell boundary, teleporting it across the torus seam
    /// if needed.
    pub(crate) fn relocate(&mut self, key: usize, body: &mut Body, hint: Fold) -> Result<()> {
        self.remove_body(key, body);
        let from = body.cell();
        self.insert_body(key, body)?;
        log::trace!(
            "body {} moved from cell {:?} to {:?} (heading {:?})",
            body.id(),
            from,
            body.cell(),
            hint
        );
        Ok(())
    }

    pub fn bodies(&self, x: usize, y: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells[self.index(x, y)].bodies.iter().copied()
    }

    // ============ Boundary elements ============

    pub(crate) fn insert_bumper(&mut self, id: BumperId, bumper: &mut Bumper) -> Result<()> {
        let cell = self.cell_of(bumper.position()).ok_or_else(|| {
            Error::InvalidParam(format!(
                "bumper position {:?} outside the unit square",
                bumper.position()
            ))
        })?;
        bumper.set_cell(cell);
        let idx = self.index(cell.0, cell.1);
        self.cells[idx].bumpers.insert(id.0);
        Ok(())
    }

    pub(crate) fn insert_xline(&mut self, id: XLineId, xline: &mut XLine) -> Result<()> {
        let x = xline.x();
        if !(0.0..=1.0).contains(&x) {
            return Err(Error::InvalidParam(format!(
                "xline position {x} outside the unit interval"
            )));
        }
        let column = ((x * self.fineness as f64).trunc() as usize).min(self.fineness - 1);
        xline.set_cell((column, 0));
        let idx = self.index(column, 0);
        self.cells[idx].xlines.insert(id.0);
        Ok(())
    }

    pub fn bumpers(&self, x: usize, y: usize) -> impl Iterator<Item = BumperId> + '_ {
        self.cells[self.index(x, y)].bumpers.iter().map(|&i| BumperId(i))
    }

    /// xlines standing in column `x`.
    pub fn xlines(&self, x: usize) -> impl Iterator<Item = XLineId> + '_ {
        self.cells[self.index(x, 0)].xlines.iter().map(|&i| XLineId(i))
    }

    // ============ Neighborhoods ============

    /// The 3×3 block around `cell` under toroidal wraparound, with the fold that brings an
    /// entity from `cell` next to each neighbor.
    pub fn neighbors(&self, cell: (usize, usize)) -> Vec<(usize, usize, Fold)> {
        let mut out = Vec::with_capacity(9);
        for dx in -1..=1isize {
            let (x, fx) = Fold::wrap(cell.0 as isize + dx, self.fineness);
            for dy in -1..=1isize {
                let (y, fy) = Fold::wrap(cell.1 as isize + dy, self.fineness);
                out.push((x, y, Fold::new(fx, fy)));
            }
        }
        out
    }

    /// The three columns around `column`, with the horizontal fold for each.
    pub fn neighbor_columns(&self, column: usize) -> [(usize, Fold); 3] {
        [-1isize, 0, 1].map(|dx| {
            let (x, fx) = Fold::wrap(column as isize + dx, self.fineness);
            (x, Fold::new(fx, 0))
        })
    }
}

fn escaped(body: &Body) -> Error {
    Error::invariant(format!(
        "body {} at {:?} cannot be indexed in the grid",
        body.id(),
        body.position()
    ))
}

/// Move `body` by whole unit squares so that its position lies in `[0, 1)²`.
fn wrap_into_unit_square(body: &mut Body) -> Result<()> {
    let p = body.position();
    if !p.is_finite() {
        return Err(escaped(body));
    }
    // rem_euclid of a tiny negative rounds up to 1.0.
    let wrap = |c: f64| {
        let w = c.rem_euclid(1.0);
        if w < 1.0 {
            w
        } else {
            0.0
        }
    };
    let folded = Vec2::new(wrap(p.x), wrap(p.y));
    if folded != p {
        body.move_to(folded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f64, y: f64) -> Body {
        Body::single(Vec2::new(x, y), Vec2::ZERO, 1.0, 0.01).unwrap()
    }

    #[test]
    fn insert_indexes_by_position() -> Result<()> {
        let mut grid = Grid::new(4)?;
        let mut b = body_at(0.4, 0.2);
        grid.insert_body(0, &mut b)?;
        assert_eq!(b.cell(), (1, 0));
        assert_eq!(grid.bodies(1, 0).collect::<Vec<_>>(), vec![0]);
        assert!(grid.contains(&b, 0.0));
        Ok(())
    }

    #[test]
    fn relocate_wraps_across_the_seam() -> Result<()> {
        let mut grid = Grid::new(4)?;
        let mut b = body_at(0.9, 0.1);
        grid.insert_body(3, &mut b)?;
        // Simulate drifting past the right edge and below the bottom edge.
        b.teleport(Fold::RIGHT);
        b.teleport(Fold::DOWN);
        grid.relocate(3, &mut b, Fold::RIGHT)?;
        assert!((b.position().x - 0.9).abs() < 1e-12);
        assert!((b.position().y - 0.1).abs() < 1e-12);
        assert_eq!(b.cell(), (3, 0));
        assert_eq!(grid.bodies(3, 0).count(), 1);
        Ok(())
    }

    #[test]
    fn remove_clears_the_cell() -> Result<()> {
        let mut grid = Grid::new(2)?;
        let mut b = body_at(0.7, 0.7);
        grid.insert_body(5, &mut b)?;
        grid.remove_body(5, &b);
        assert_eq!(grid.bodies(1, 1).count(), 0);
        Ok(())
    }

    #[test]
    fn non_finite_position_is_fatal() -> Result<()> {
        let mut grid = Grid::new(2)?;
        let mut b = Body::single(Vec2::new(0.5, 0.5), Vec2::new(f64::MAX, 0.0), 1.0, 0.01)?;
        b.integrate(10.0);
        assert!(b.position().x.is_infinite());
        assert!(matches!(grid.insert_body(0, &mut b), Err(Error::Invariant(_))));
        Ok(())
    }

    #[test]
    fn far_positions_fold_in_one_step() -> Result<()> {
        let mut grid = Grid::new(2)?;
        let mut b = body_at(1.0e17, -2.25);
        grid.insert_body(0, &mut b)?;
        assert_eq!(b.position(), Vec2::new(0.0, 0.75));
        assert_eq!(b.cell(), (0, 1));

        let mut edge = body_at(-1e-20, 0.5);
        grid.insert_body(1, &mut edge)?;
        assert_eq!(edge.position().x, 0.0);
        Ok(())
    }

    #[test]
    fn xlines_live_in_row_zero() -> Result<()> {
        let mut grid = Grid::new(4)?;
        let mut line = XLine::new(0.6)?;
        grid.insert_xline(XLineId(0), &mut line)?;
        assert_eq!(line.cell(), (2, 0));
        assert_eq!(grid.xlines(2).collect::<Vec<_>>(), vec![XLineId(0)]);

        let mut edge = XLine::new(1.0)?;
        grid.insert_xline(XLineId(1), &mut edge)?;
        assert_eq!(edge.cell(), (3, 0));
        assert!(grid.insert_xline(XLineId(2), &mut XLine::new(1.5)?).is_err());
        Ok(())
    }

    #[test]
    fn neighbors_fold_at_edges() -> Result<()> {
        let grid = Grid::new(3)?;
        let n = grid.neighbors((0, 2));
        assert_eq!(n.len(), 9);
        assert!(n.contains(&(2, 0, Fold::new(1, -1))));
        assert!(n.contains(&(1, 1, Fold::DIRECT)));
        let cols = grid.neighbor_columns(2);
        assert_eq!(cols, [(1, Fold::DIRECT), (2, Fold::DIRECT), (0, Fold::LEFT)]);
        Ok(())
    }

    #[test]
    fn zero_fineness_rejected() {
        assert!(Grid::new(0).is_err());
    }
}
