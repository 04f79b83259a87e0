//! High-level runtime engine settings
//!
//! Selects gravity solver, integrator, collision detection and boundary
//! used when building and running a `Simulation`

use serde::{Deserialize, Serialize};

use crate::configuration::config::{CollisionConfig, GravityConfig, IntegratorConfig};

/// Tree code box edge length
pub const TREE_BOX_SIZE: f64 = 10.0;

/// Tree code opening angle squared
pub const TREE_OPENING_ANGLE2: f64 = 1.5;

/// What happens to bodies that leave the simulation box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    None,
    /// Bodies outside the cube of edge `size` centred on the origin are removed
    Open { size: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub gravity: GravityConfig, // direct sum or tree
    pub integrator: IntegratorConfig, // verlet or leapfrog
    pub collision: CollisionConfig, // none, direct or line
    pub boundary: Boundary,
    pub theta: f64, // opening angle for the tree
}

impl Engine {
    /// Settings for a given gravity mode. The tree code gets a fixed box,
    /// an open boundary and a fixed opening angle.
    pub fn new(gravity: GravityConfig, integrator: IntegratorConfig, collision: CollisionConfig) -> Self {
        let (boundary, theta) = match gravity {
            GravityConfig::Tree => (Boundary::Open { size: TREE_BOX_SIZE }, TREE_OPENING_ANGLE2.sqrt()),
            GravityConfig::Basic => (Boundary::None, TREE_OPENING_ANGLE2.sqrt()),
        };
        Self {
            gravity,
            integrator,
            collision,
            boundary,
            theta,
        }
    }

    /// Fixed tree bounds when the box is configured
    pub fn tree_bounds(&self) -> Option<f64> {
        match self.boundary {
            Boundary::Open { size } => Some(size),
            Boundary::None => None,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(GravityConfig::Basic, IntegratorConfig::Verlet, CollisionConfig::Line)
    }
}
