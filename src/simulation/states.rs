//! Core state types for the cluster simulation.
//!
//! - `ParticleId` is a permanent handle; positional indices shift on removal,
//!   ids never do.
//! - `Body` is one particle (central object or star).
//! - `System` holds the ordered body list and the current simulation time `t`.
//!
//! Index 0 is always the central object.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub type NVec3 = Vector3<f64>;

/// Stable particle handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: ParticleId, // permanent handle
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
    pub radius: f64, // collision radius
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct System {
    pub bodies: Vec<Body>, // ordered collection, central object first
    pub t: f64, // time
}

impl System {
    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }

    /// Mass-weighted center of mass position and velocity
    pub fn center_of_mass(&self) -> (NVec3, NVec3) {
        let m = self.total_mass();
        if m <= 0.0 {
            return (NVec3::zeros(), NVec3::zeros());
        }
        let mut x = NVec3::zeros();
        let mut v = NVec3::zeros();
        for b in &self.bodies {
            x += b.m * b.x;
            v += b.m * b.v;
        }
        (x / m, v / m)
    }

    pub fn positions(&self) -> Vec<NVec3> {
        self.bodies.iter().map(|b| b.x).collect()
    }
}
