mod common;

use common::{ball, close, record};
use molsim::core::{Atom, Body, Bumper, BumperHit, Engine, Filter, Thermal, Vec2, XLine, XLineHit};
use molsim::error::Result;

#[test]
fn rigid_xline_reflects_normal_component() -> Result<()> {
    let mut engine = Engine::new(1)?;
    let id = engine.add(ball(0.2, 0.5, 1.0, 0.5, 0.05)?)?;
    engine.add_xline(XLine::new(0.5)?)?;
    let log = record::<XLineHit>(&mut engine, Filter::All)?;

    engine.run(0.3)?;

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(close(log[0].time, 0.25));
    assert!(close(log[0].body.velocity().delta().x, -2.0));
    assert!(close(log[0].module, 2.0));
    let v = engine.body(id).unwrap().velocity();
    assert!(close(v.x, -1.0) && close(v.y, 0.5));
    Ok(())
}

#[test]
fn x_only_fixed_temperature() -> Result<()> {
    let mut engine = Engine::new(1)?;
    let id = engine.add(ball(0.2, 0.5, 1.0, 0.5, 0.05)?)?;
    engine.add_xline(XLine::with_flags(0.5, Some(3.0), false, false, true)?)?;
    engine.run(0.3)?;
    let v = engine.body(id).unwrap().velocity();
    assert!(close(v.x, -3.0), "vx {}", v.x);
    assert!(close(v.y, 0.5));
    Ok(())
}

#[test]
fn x_only_multiplicative() -> Result<()> {
    let mut engine = Engine::new(1)?;
    let id = engine.add(ball(0.8, 0.5, -2.0, 0.1, 0.05)?)?;
    engine.add_xline(XLine::with_flags(0.5, Some(0.5), false, true, true)?)?;
    let log = record::<XLineHit>(&mut engine, Filter::All)?;
    engine.run(0.2)?;
    let v = engine.body(id).unwrap().velocity();
    assert!(close(v.x, 1.0), "vx {}", v.x);
    assert!(close(v.y, 0.1));
    // Reported as the change of x-momentum.
    assert!(close(log.borrow()[0].module, 3.0));
    Ok(())
}

#[test]
fn x_only_random_rebound_is_reproducible() -> Result<()> {
    let run = |seed| -> Result<Vec2> {
        let mut engine = Engine::with_seed(1, Some(seed))?;
        let id = engine.add(ball(0.2, 0.5, 1.0, 0.25, 0.05)?)?;
        engine.add_xline(XLine::with_flags(0.5, Some(2.0), true, false, true)?)?;
        engine.run(0.26)?;
        Ok(engine.body(id).unwrap().velocity())
    };
    let v = run(11)?;
    assert!(v.x < 0.0 && v.x.is_finite());
    assert!(close(v.y, 0.25));
    assert_eq!(run(11)?, v);
    Ok(())
}

#[test]
fn bar_rebounds_off_xline_elastically() -> Result<()> {
    // Three atoms along x: only the leading one touches the wall, in line with the center.
    let atoms = [0.0, 0.1, 0.2]
        .iter()
        .map(|&dx| Atom::new(Vec2::new(dx, 0.0), 1.0, 0.05))
        .collect::<Result<Vec<_>>>()?;
    let bar = Body::new(atoms, Vec2::new(0.2, 0.5), Vec2::new(1.0, 0.0), 0.0, 0.0)?;

    let mut engine = Engine::new(1)?;
    let id = engine.add(bar)?;
    engine.add_xline(XLine::new(0.5)?)?;
    let log = record::<XLineHit>(&mut engine, Filter::All)?;
    let energy = engine.body(id).unwrap().energy();

    engine.run(0.3)?;

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!((log[0].time - 0.15).abs() < 1e-9, "time {}", log[0].time);
    assert_eq!(log[0].body.atom, 2);
    assert!(close(log[0].body.velocity().after.x, -1.0));
    assert!(log[0].body.angular_velocity().after.abs() < 1e-9);
    assert!((engine.body(id).unwrap().energy() - energy).abs() < 1e-9);
    Ok(())
}

#[test]
fn thermal_bumper_sets_energy() -> Result<()> {
    let mut engine = Engine::new(1)?;
    let id = engine.add(ball(0.2, 0.5, 1.0, 0.0, 0.05)?)?;
    engine.add_bumper(Bumper::with_thermal(Vec2::new(0.8, 0.5), 0.05, Thermal::Fixed(2.0))?)?;
    let log = record::<BumperHit>(&mut engine, Filter::All)?;
    engine.run(0.6)?;

    assert!(close(log.borrow()[0].body.energy().after, 2.0));
    let body = engine.body(id).unwrap();
    assert!(close(body.energy(), 2.0));
    assert!(body.velocity().x < 0.0);
    Ok(())
}

#[test]
fn reset_energy_everywhere_and_by_tag() -> Result<()> {
    let mut engine = Engine::new(2)?;
    let a = engine.add(ball(0.2, 0.2, 1.0, 0.0, 0.01)?)?;
    let b = engine.add(ball(0.7, 0.7, 0.0, 3.0, 0.01)?)?;
    engine.tag(b, 9)?;

    engine.reset_energy(2.0)?;
    for id in [a, b] {
        assert!(close(engine.body(id).unwrap().energy(), 2.0));
    }

    engine.reset_energy_tagged(9, 8.0)?;
    assert!(close(engine.body(a).unwrap().energy(), 2.0));
    assert!(close(engine.body(b).unwrap().velocity().y, 4.0));

    assert!(engine.reset_energy(-1.0).is_err());
    engine.run(1.0)?;
    Ok(())
}

#[test]
fn invalid_elements_rejected() {
    assert!(Bumper::new(Vec2::new(0.5, 0.5), -0.1).is_err());
    assert!(XLine::with_flags(0.5, Some(1.0), true, true, false).is_err());
    assert!(XLine::with_flags(0.5, None, true, false, false).is_err());
    let mut engine = Engine::new(2).unwrap();
    assert!(engine.add_xline(XLine::new(1.5).unwrap()).is_err());
    assert!(engine
        .add_bumper(Bumper::new(Vec2::new(1.2, 0.5), 0.1).unwrap())
        .is_err());
}
