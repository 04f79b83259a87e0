use std::io::Write;

use approx::assert_relative_eq;

use nucdisk::configuration::config::{CollisionConfig, GravityConfig, IntegratorConfig};
use nucdisk::simulation::barnes_hut::BarnesHutTree;
use nucdisk::simulation::context::{Simulation, StepEvent};
use nucdisk::simulation::engine::Engine;
use nucdisk::simulation::forces::{AccelSet, NewtonianGravity, NewtonianGravityBarnesHut};
use nucdisk::simulation::orbits::{cartesian_to_orbital_elements, orbital_elements_to_cartesian, OrbitalElements};
use nucdisk::simulation::params::Parameters;
use nucdisk::simulation::snapshot::SnapshotArchive;
use nucdisk::simulation::states::{Body, NVec3, ParticleId, System};

/// Build a simple 2-body System separated along x-axis
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> System {
    let b1 = Body {
        id: ParticleId(0),
        x: [-dist / 2.0, 0.0, 0.0].into(),
        v: [0.0, 0.0, 0.0].into(),
        m: m1,
        radius: 0.0,
    };
    let b2 = Body {
        id: ParticleId(1),
        x: [dist / 2.0, 0.0, 0.0].into(),
        v: [0.0, 0.0, 0.0].into(),
        m: m2,
        radius: 0.0,
    };
    System {
        bodies: vec![b1, b2],
        t: 0.0,
    }
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters {
        dt: 1e-3,
        eps2: 0.0,
        g: 0.1,
    }
}

/// Build a gravity term + AccelSet
pub fn gravity_set(p: &Parameters) -> AccelSet {
    AccelSet::new().with(NewtonianGravity { g: p.g, eps2: p.eps2 })
}

/// Central object of mass 1 plus one star on `elements`
fn star_around_center(engine: Engine, dt: f64, elements: &OrbitalElements, radius: f64) -> Simulation {
    let mut sim = Simulation::new(engine, Parameters::with_dt(dt));
    sim.add(1.0, radius, NVec3::zeros(), NVec3::zeros());
    sim.add_orbiting(1e-6, 0.0, elements, 0).unwrap();
    sim
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let sys = two_body_system(1.0, 2.0, 3.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    let net = acc[0] * sys.bodies[0].m + acc[1] * sys.bodies[1].m;

    assert!(net.norm() < 1e-12, "Net momentum not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let sys = two_body_system(2.0, 1.0, 1.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    let dx = sys.bodies[1].x - sys.bodies[0].x;
    assert!(acc[0].dot(&dx) > 0.0, "Acceleration is not toward second body");
}

#[test]
fn gravity_inverse_square_law() {
    let sys_r = two_body_system(1.0, 1.0, 1.0);
    let sys_2r = two_body_system(2.0, 1.0, 1.0);
    let p = test_params();
    let forces = gravity_set(&p);

    let mut acc_r = vec![NVec3::zeros(); 2];
    let mut acc_2r = vec![NVec3::zeros(); 2];

    forces.accumulate_accels(sys_r.t, &sys_r, &mut acc_r);
    forces.accumulate_accels(sys_2r.t, &sys_2r, &mut acc_2r);

    let ratio = acc_r[0].norm() / acc_2r[0].norm();
    assert_relative_eq!(ratio, 4.0, epsilon = 1e-9);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let mut p = test_params();
    p.eps2 = 0.1;

    let sys = two_body_system(1e-9, 1.0, 1.0);
    let forces = gravity_set(&p);

    let mut acc = vec![NVec3::zeros(); 2];
    forces.accumulate_accels(sys.t, &sys, &mut acc);

    assert!(acc[0].norm() < 1e9, "Softening failed; acceleration too large");
}

// ==================================================================================
// Barnes-Hut tests
// ==================================================================================

fn ring_system(n: usize) -> System {
    let mut bodies = vec![Body {
        id: ParticleId(0),
        x: NVec3::zeros(),
        v: NVec3::zeros(),
        m: 1.0,
        radius: 0.0,
    }];
    for k in 0..n {
        let phi = k as f64 * std::f64::consts::TAU / n as f64;
        let r = 1.0 + 0.1 * (k % 3) as f64;
        bodies.push(Body {
            id: ParticleId(k as u64 + 1),
            x: NVec3::new(r * phi.cos(), r * phi.sin(), 0.01 * (k % 5) as f64),
            v: NVec3::zeros(),
            m: 1e-3,
            radius: 0.0,
        });
    }
    System { bodies, t: 0.0 }
}

#[test]
fn barnes_hut_zero_angle_matches_direct_sum() {
    let sys = ring_system(40);
    let direct = AccelSet::new().with(NewtonianGravity { g: 1.0, eps2: 0.0 });
    let tree = AccelSet::new().with(NewtonianGravityBarnesHut {
        g: 1.0,
        eps2: 0.0,
        theta: 0.0,
        box_size: Some(10.0),
    });

    let mut a_direct = vec![NVec3::zeros(); sys.bodies.len()];
    let mut a_tree = vec![NVec3::zeros(); sys.bodies.len()];
    direct.accumulate_accels(0.0, &sys, &mut a_direct);
    tree.accumulate_accels(0.0, &sys, &mut a_tree);

    for (d, t) in a_direct.iter().zip(&a_tree) {
        assert_relative_eq!((d - t).norm(), 0.0, epsilon = 1e-10 * d.norm().max(1.0));
    }
}

#[test]
fn barnes_hut_default_angle_is_close_to_direct_sum() {
    let sys = ring_system(60);
    let mut a_direct = vec![NVec3::zeros(); sys.bodies.len()];
    AccelSet::new()
        .with(NewtonianGravity { g: 1.0, eps2: 0.0 })
        .accumulate_accels(0.0, &sys, &mut a_direct);

    let tree = BarnesHutTree::build(&sys, Some(10.0));
    for (i, d) in a_direct.iter().enumerate().skip(1) {
        let a = tree.force_on_body(i, &sys, 1.0, 0.0, 1.5f64.sqrt());
        // the central object dominates every star's acceleration
        assert!((a - d).norm() < 0.05 * d.norm(), "body {i}: {a:?} vs {d:?}");
    }
}

// ==================================================================================
// Orbit conversion tests
// ==================================================================================

#[test]
fn orbital_elements_round_trip() {
    let mu = 1.0 + 5e-5;
    let cases = [
        OrbitalElements::new(1.3, 0.7, 0.05, 1.1, 2.3, 0.4),
        OrbitalElements::new(1.0, 0.2, 1.2, 4.0, 0.5, 5.5),
        OrbitalElements::new(2.0, 0.95, 0.3, 0.2, 3.5, 3.0),
    ];

    for el in cases {
        let (r, v) = orbital_elements_to_cartesian(mu, &el);
        let back = cartesian_to_orbital_elements(mu, r, v);

        assert_relative_eq!(back.semi_major_axis, el.semi_major_axis, max_relative = 1e-10);
        assert_relative_eq!(back.eccentricity, el.eccentricity, epsilon = 1e-10);
        assert_relative_eq!(back.inclination, el.inclination, epsilon = 1e-10);
        assert_relative_eq!(back.longitude_ascending_node, el.longitude_ascending_node, epsilon = 1e-9);
        assert_relative_eq!(back.argument_of_periapsis, el.argument_of_periapsis, epsilon = 1e-9);
        assert_relative_eq!(back.mean_anomaly, el.mean_anomaly, epsilon = 1e-9);
    }
}

#[test]
fn circular_equatorial_orbit_has_zero_angles() {
    let el = cartesian_to_orbital_elements(1.0, NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 1.0, 0.0));

    assert_relative_eq!(el.semi_major_axis, 1.0, epsilon = 1e-12);
    assert_relative_eq!(el.eccentricity, 0.0, epsilon = 1e-12);
    assert_relative_eq!(el.inclination, 0.0, epsilon = 1e-12);
    assert_relative_eq!(el.longitude_ascending_node, 0.0);
    assert_relative_eq!(el.argument_of_periapsis, 0.0);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn verlet_conserves_energy_over_an_orbit() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::None);
    let el = OrbitalElements::new(1.0, 0.3, 0.1, 0.0, 0.0, 0.0);
    let mut sim = star_around_center(engine, 1e-3, &el, 0.0);
    sim.move_to_com();

    let e0 = sim.energy();
    let l0 = sim.angular_momentum();
    let period = el.period(1.0 + 1e-6);
    assert_relative_eq!(period, std::f64::consts::TAU, max_relative = 1e-6);
    let events = sim.integrate(period);

    assert!(events.is_empty());
    assert_relative_eq!(sim.t(), period);
    assert_relative_eq!(sim.energy(), e0, max_relative = 1e-5);
    assert_relative_eq!((sim.angular_momentum() - l0).norm(), 0.0, epsilon = 1e-12);

    // one full period brings the star back to its starting orbit phase
    let el_end = sim.orbit_of(1).unwrap();
    assert_relative_eq!(el_end.semi_major_axis, 1.0, max_relative = 1e-4);
}

#[test]
fn leapfrog_conserves_energy_over_an_orbit() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Leapfrog, CollisionConfig::None);
    let el = OrbitalElements::new(1.5, 0.5, 0.0, 0.0, 1.0, 2.0);
    let mut sim = star_around_center(engine, 1e-3, &el, 0.0);

    let e0 = sim.energy();
    sim.integrate(4.0);
    assert_relative_eq!(sim.energy(), e0, max_relative = 1e-4);
}

#[test]
fn integrate_lands_on_target_time() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::None);
    let el = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let mut sim = star_around_center(engine, 0.3, &el, 0.0);

    sim.integrate(1.0);
    assert_eq!(sim.t(), 1.0);

    // integrating to the past is a no-op
    sim.integrate(0.5);
    assert_eq!(sim.t(), 1.0);
}

#[test]
fn tree_integration_follows_direct_sum() {
    let el = OrbitalElements::new(1.2, 0.4, 0.2, 0.3, 0.4, 1.0);
    let mut direct = star_around_center(
        Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::None),
        1e-3,
        &el,
        0.0,
    );
    let mut tree = star_around_center(
        Engine::new(GravityConfig::Tree, IntegratorConfig::Verlet, CollisionConfig::None),
        1e-3,
        &el,
        0.0,
    );

    direct.integrate(1.0);
    tree.integrate(1.0);

    // two bodies never share a tree cell, so the forces are exact
    let d = direct.bodies()[1].x - tree.bodies()[1].x;
    assert!(d.norm() < 1e-9, "tree and direct diverged by {}", d.norm());
}

// ==================================================================================
// Collision and boundary tests
// ==================================================================================

#[test]
fn plunging_star_reports_tde_with_its_orbit() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::Line);
    let mut sim = Simulation::new(engine, Parameters::with_dt(1e-3));
    sim.add(1.0, 0.1, NVec3::zeros(), NVec3::zeros());
    // nearly radial infall from r = 1
    let star = sim.add(1e-6, 0.0, NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 1e-3, 0.0));

    let events = sim.integrate(1.5);

    let tde = events
        .iter()
        .find_map(|e| match e {
            StepEvent::Collision(c) if c.index_a == 0 => Some(c.clone()),
            _ => None,
        })
        .expect("star should hit the central object");

    assert_eq!(tde.index_b, 1);
    assert_eq!(tde.id_b, star);
    assert!(tde.distance < 0.1);
    assert_relative_eq!(tde.orbit.semi_major_axis, 0.5, max_relative = 1e-2);
    assert!(tde.orbit.eccentricity > 0.99);

    // disruptions do not remove anything
    assert_eq!(sim.len(), 2);
}

#[test]
fn no_collisions_when_disabled() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::None);
    let mut sim = Simulation::new(engine, Parameters::with_dt(1e-3));
    sim.add(1.0, 1e-2, NVec3::zeros(), NVec3::zeros());
    sim.add(1e-6, 0.0, NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 1e-3, 0.0));

    assert!(sim.integrate(2.0).is_empty());
}

#[test]
fn tree_mode_removes_bodies_leaving_the_box() {
    let engine = Engine::new(GravityConfig::Tree, IntegratorConfig::Verlet, CollisionConfig::None);
    let mut sim = Simulation::new(engine, Parameters::with_dt(1e-2));
    sim.add(1.0, 0.0, NVec3::zeros(), NVec3::zeros());
    let runaway = sim.add(1e-6, 0.0, NVec3::new(4.9, 0.0, 0.0), NVec3::new(10.0, 0.0, 0.0));
    let stays = sim.add_orbiting(1e-6, 0.0, &OrbitalElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0), 0).unwrap();

    let events = sim.integrate(0.1);

    assert!(events
        .iter()
        .any(|e| matches!(e, StepEvent::Escape { id, .. } if *id == runaway)));
    assert_eq!(sim.index_of(runaway), None);
    assert_eq!(sim.index_of(stays), Some(1));
}

#[test]
fn snapshot_restores_the_state() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Leapfrog, CollisionConfig::Direct);
    let el = OrbitalElements::new(1.0, 0.1, 0.0, 0.0, 0.0, 1.0);
    let mut sim = star_around_center(engine, 1e-3, &el, 1e-4);
    sim.integrate(0.5);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.bin");
    sim.snapshot().save(&path).unwrap();

    let mut restored = Simulation::from_snapshot(nucdisk::simulation::snapshot::Snapshot::load(&path).unwrap());
    assert_eq!(restored.t(), sim.t());
    assert_eq!(restored.engine().integrator, IntegratorConfig::Leapfrog);

    sim.integrate(1.0);
    restored.integrate(1.0);
    assert_eq!(sim.bodies()[1].x, restored.bodies()[1].x);

    // restored ids keep counting where the saved run stopped
    let next = restored.add(1e-6, 0.0, NVec3::new(3.0, 0.0, 0.0), NVec3::zeros());
    assert_eq!(next, ParticleId(2));
}

#[test]
fn archive_with_an_oversized_length_prefix_is_rejected() {
    let engine = Engine::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::None);
    let el = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let sim = star_around_center(engine, 1e-3, &el, 0.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.bin");
    let archive = SnapshotArchive::create(&path).unwrap();
    archive.append(&sim.snapshot()).unwrap();
    assert_eq!(SnapshotArchive::read_all(&path).unwrap().len(), 1);

    // a corrupt prefix claiming far more than the file holds
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&(1u64 << 40).to_le_bytes()).unwrap();
    file.write_all(&[0u8; 16]).unwrap();
    drop(file);

    match SnapshotArchive::read_all(&path) {
        Err(nucdisk::Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidData),
        other => panic!("expected invalid data, got {:?}", other.map(|s| s.len())),
    }
}
