//! Fixed-step time integrators
//!
//! A double-kick velocity–Verlet and a single-evaluation leapfrog
//! (drift-kick-drift), both driven by `AccelSet`

use super::forces::AccelSet;
use super::states::{NVec3, System};

/// Advance the system by `dt` using velocity–Verlet.
/// Uses two force evaluations per step and updates positions, velocities,
/// and `sys.t` in-place.
pub fn verlet(sys: &mut System, forces: &AccelSet, dt: f64) {
    let n = sys.bodies.len();
    if n == 0 {
        sys.t += dt;
        return;
    }
    let half_dt = 0.5 * dt;

    // a_n from x_n at time t_n
    let mut a_old = vec![NVec3::zeros(); n];
    forces.accumulate_accels(sys.t, &*sys, &mut a_old);

    // Kick: v_n+1/2 = v_n + (dt/2) a_n
    for (b, a) in sys.bodies.iter_mut().zip(a_old.iter()) {
        b.v += half_dt * *a;
    }

    // Drift: x_n+1 = x_n + dt v_n+1/2
    for b in sys.bodies.iter_mut() {
        b.x += dt * b.v;
    }

    sys.t += dt;

    // a_n+1 from x_n+1 at time t_n+1
    let mut a_new = vec![NVec3::zeros(); n];
    forces.accumulate_accels(sys.t, &*sys, &mut a_new);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) a_n+1
    for (b, a) in sys.bodies.iter_mut().zip(a_new.iter()) {
        b.v += half_dt * *a;
    }
}

/// Advance the system by `dt` using drift-kick-drift leapfrog.
/// One force evaluation per step.
pub fn leapfrog(sys: &mut System, forces: &AccelSet, dt: f64) {
    let n = sys.bodies.len();
    if n == 0 {
        sys.t += dt;
        return;
    }
    let half_dt = 0.5 * dt;

    // Drift: x_half = x_n + (dt/2) v_n
    for b in sys.bodies.iter_mut() {
        b.x += half_dt * b.v;
    }

    let t_mid = sys.t + half_dt;

    // Kick: v_n+1 = v_n + dt a(x_half)
    let mut a_mid = vec![NVec3::zeros(); n];
    forces.accumulate_accels(t_mid, &*sys, &mut a_mid);
    for (b, a) in sys.bodies.iter_mut().zip(a_mid.iter()) {
        b.v += dt * *a;
    }

    // Drift: x_n+1 = x_half + (dt/2) v_n+1
    for b in sys.bodies.iter_mut() {
        b.x += half_dt * b.v;
    }

    sys.t += dt;
}
