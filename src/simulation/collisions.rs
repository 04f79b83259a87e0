//! Collision detection between sized bodies
//!
//! Only pairs whose radii sum to something positive can collide, so stars
//! with zero radius only ever collide with the central object.
//!
//! - `direct`: overlap at the end of a step
//! - `line`: closest approach along the straight segments travelled during
//!   the step (catches fast fly-throughs that `direct` would step over)

use crate::configuration::config::CollisionConfig;
use crate::simulation::orbits::{cartesian_to_orbital_elements, OrbitalElements};
use crate::simulation::states::{NVec3, ParticleId, System};

/// A detected collision. `index_a < index_b`, both positional at detection time.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub t: f64,
    pub index_a: usize,
    pub index_b: usize,
    pub id_a: ParticleId,
    pub id_b: ParticleId,
    pub distance: f64, // closest distance found
    pub orbit: OrbitalElements, // orbit of b around a at detection
}

/// Detect collisions after a step.
///
/// `before` holds positions at the start of the step, in the same order as
/// `sys.bodies`; it is only read in `line` mode.
pub fn detect(mode: CollisionConfig, before: &[NVec3], sys: &System, g: f64) -> Vec<Collision> {
    if mode == CollisionConfig::None {
        return Vec::new();
    }

    let bodies = &sys.bodies;
    let sized: Vec<usize> = (0..bodies.len()).filter(|&i| bodies[i].radius > 0.0).collect();
    let mut found = Vec::new();

    for &i in &sized {
        for j in 0..bodies.len() {
            if j == i {
                continue;
            }
            // pairs of two sized bodies are visited from the lower index only
            if bodies[j].radius > 0.0 && j < i {
                continue;
            }

            let reach = bodies[i].radius + bodies[j].radius;
            let d_end = bodies[j].x - bodies[i].x;

            let distance = match mode {
                CollisionConfig::Line if before.len() == bodies.len() => {
                    let d_start = before[j] - before[i];
                    closest_approach(d_start, d_end)
                }
                _ => d_end.norm(),
            };

            if distance < reach {
                let (a, b) = if i < j { (i, j) } else { (j, i) };
                let (ba, bb) = (&bodies[a], &bodies[b]);
                found.push(Collision {
                    t: sys.t,
                    index_a: a,
                    index_b: b,
                    id_a: bodies[a].id,
                    id_b: bodies[b].id,
                    distance,
                    orbit: cartesian_to_orbital_elements(g * (ba.m + bb.m), bb.x - ba.x, bb.v - ba.v),
                });
            }
        }
    }

    found.sort_by_key(|c| (c.index_a, c.index_b));
    found
}

/// Minimum of |d0 + s (d1 - d0)| over s in [0, 1]
pub fn closest_approach(d0: NVec3, d1: NVec3) -> f64 {
    let delta = d1 - d0;
    let len2 = delta.norm_squared();
    if len2 == 0.0 {
        return d0.norm();
    }
    let s = (-d0.dot(&delta) / len2).clamp(0.0, 1.0);
    (d0 + s * delta).norm()
}
