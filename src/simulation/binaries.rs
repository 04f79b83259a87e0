//! Bound-pair detection
//!
//! A pair of stars counts as a binary when
//! - their separation is inside the pair's Hill radius with respect to the
//!   central object, `r_cm * ((m1 + m2) / (3 M))^(1/3)`, and
//! - their relative two-body orbit is bound (negative specific energy).
//!
//! The central object (index 0) is never part of a pair.

use serde::{Deserialize, Serialize};

use crate::simulation::orbits::cartesian_to_orbital_elements;
use crate::simulation::states::System;

/// One detected binary. `index1 < index2`, positional at detection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryPair {
    pub t: f64,
    pub index1: usize,
    pub index2: usize,
    pub separation: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
}

impl BinaryPair {
    /// Row as written to the `_bins` table: t i1 i2 separation a e
    pub fn to_row(&self) -> String {
        format!(
            "{:.16e} {} {} {:.16e} {:.16e} {:.16e}",
            self.t, self.index1, self.index2, self.separation, self.semi_major_axis, self.eccentricity
        )
    }
}

/// Hill radius of a pair of total mass `m_pair` at distance `r` from a
/// central mass `m_central`
pub fn hill_radius(r: f64, m_pair: f64, m_central: f64) -> f64 {
    r * (m_pair / (3.0 * m_central)).cbrt()
}

/// Find every bound pair among the stars of `sys`.
pub fn find_binaries(sys: &System, g: f64) -> Vec<BinaryPair> {
    let bodies = &sys.bodies;
    if bodies.len() < 3 {
        return Vec::new();
    }

    let central = &bodies[0];
    let mut pairs = Vec::new();

    for i in 1..bodies.len() {
        let bi = &bodies[i];
        for j in (i + 1)..bodies.len() {
            let bj = &bodies[j];

            let m_pair = bi.m + bj.m;
            if m_pair <= 0.0 {
                continue;
            }

            let dx = bj.x - bi.x;
            let d2 = dx.norm_squared();

            let r_cm = ((bi.m * bi.x + bj.m * bj.x) / m_pair - central.x).norm();
            let r_hill = hill_radius(r_cm, m_pair, central.m);
            if d2 >= r_hill * r_hill {
                continue;
            }

            let dv = bj.v - bi.v;
            let mu = g * m_pair;
            let separation = d2.sqrt();
            if 0.5 * dv.norm_squared() - mu / separation >= 0.0 {
                continue;
            }

            let orbit = cartesian_to_orbital_elements(mu, dx, dv);
            pairs.push(BinaryPair {
                t: sys.t,
                index1: i,
                index2: j,
                separation,
                semi_major_axis: orbit.semi_major_axis,
                eccentricity: orbit.eccentricity,
            });
        }
    }

    pairs
}
