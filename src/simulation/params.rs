//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - fixed integration step size `dt`,
//! - softening and gravitational constant (`eps2`, `g`)

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Step used when the configuration leaves `dt` at 0: a thousandth of the
/// orbital period at a = 1 around a unit mass.
pub const DEFAULT_DT: f64 = TAU / 1000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameters {
    pub dt: f64, // step size
    pub eps2: f64, // softening
    pub g: f64, // gravitational constant
}

impl Parameters {
    /// Parameters with G = 1, no softening and the given step (0 -> default)
    pub fn with_dt(dt: f64) -> Self {
        Self {
            dt: if dt > 0.0 { dt } else { DEFAULT_DT },
            eps2: 0.0,
            g: 1.0,
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::with_dt(0.0)
    }
}
