mod common;

use common::ball;
use molsim::core::{Body, Bumper, Engine, Vec2};
use molsim::error::Result;

#[test]
fn body_is_indexed_by_position() -> Result<()> {
    let mut engine = Engine::new(4)?;
    engine.add(ball(0.4, 0.2, 0.0, 0.0, 0.01)?)?;
    let mut cells = Vec::new();
    engine.each(|b| cells.push(b.cell()));
    assert_eq!(cells, vec![(1, 0)]);
    Ok(())
}

#[test]
fn bumper_is_indexed_by_position() -> Result<()> {
    let mut engine = Engine::new(4)?;
    engine.add_bumper(Bumper::new(Vec2::new(0.4, 0.2), 0.03)?)?;
    assert_eq!(engine.bumpers()[0].cell(), (1, 0));
    Ok(())
}

#[test]
fn body_walks_the_diagonal() -> Result<()> {
    let mut engine = Engine::new(5)?;
    engine.add(ball(0.1, 0.1, 0.2, 0.2, 0.01)?)?;
    for i in 0..5usize {
        let mut cells = Vec::new();
        engine.each(|b| cells.push(b.cell()));
        assert_eq!(cells, vec![(i, i)], "before run({})", 1 + i);
        engine.run(1.0 + i as f64)?;
    }
    Ok(())
}

#[test]
fn body_wraps_around_the_torus() -> Result<()> {
    let mut engine = Engine::new(4)?;
    let id = engine.add(ball(0.9, 0.5, 1.0, 0.0, 0.01)?)?;
    engine.run(0.3)?;
    let body = engine.body(id).unwrap();
    assert!((body.position().x - 0.2).abs() < 1e-12);
    assert_eq!(body.cell(), (0, 2));
    Ok(())
}

#[test]
fn removal_shrinks_traversal() -> Result<()> {
    let mut engine = Engine::new(4)?;
    let ids = [(0.2, 0.2), (0.4, 0.4), (0.7, 0.7), (0.9, 0.9)]
        .iter()
        .map(|&(x, y)| engine.add(ball(x, y, 0.0, 0.0, 0.01)?))
        .collect::<Result<Vec<_>>>()?;

    let mut count = 0;
    engine.each(|_| count += 1);
    assert_eq!(count, 4);

    engine.remove(ids[0])?;
    engine.remove(ids[2])?;

    let mut seen = Vec::new();
    engine.each(|b| seen.push(b.id()));
    assert_eq!(seen, vec![ids[1], ids[3]]);
    assert_eq!(engine.len(), 2);
    Ok(())
}

fn crowd() -> Result<Vec<Body>> {
    [
        (0.2, 0.2, 1.5, 1.5),
        (0.2, 0.3, 1.6, 1.5),
        (0.3, 0.2, 1.6, 1.5),
        (0.3, 0.3, 1.0, 1.0),
        (0.7, 0.7, -1.0, -1.0),
        (0.7, 0.8, -1.5, -1.6),
        (0.8, 0.7, -1.6, -1.5),
        (0.8, 0.8, -1.5, -1.5),
    ]
    .iter()
    .map(|&(x, y, vx, vy)| ball(x, y, vx, vy, 0.01))
    .collect()
}

#[test]
fn grid_prunes_candidate_pairs() -> Result<()> {
    let mut single_cell = Engine::new(1)?;
    for body in crowd()? {
        single_cell.add(body)?;
    }
    assert_eq!(single_cell.pending_events(), 25);

    let mut fine = Engine::new(6)?;
    for body in crowd()? {
        fine.add(body)?;
    }
    assert_eq!(fine.pending_events(), 11);
    Ok(())
}

#[test]
fn far_off_body_is_folded_on_insert() -> Result<()> {
    let mut engine = Engine::new(4)?;
    let id = engine.add(ball(1e17, -2.25, 0.0, 0.0, 0.01)?)?;
    let body = engine.body(id).unwrap();
    assert_eq!(body.position(), Vec2::new(0.0, 0.75));
    assert_eq!(body.cell(), (0, 3));
    Ok(())
}
