//! Force / acceleration contributors for the cluster engine
//!
//! Defines the acceleration trait, direct Newtonian gravity and a
//! Barnes–Hut–based variant

use crate::configuration::config::GravityConfig;
use crate::simulation::barnes_hut::BarnesHutTree;
use crate::simulation::engine::Engine;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec3, System};

/// Collection of acceleration terms (gravity, drag, etc)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Gravity term matching the engine's gravity mode
    pub fn from_engine(engine: &Engine, params: &Parameters) -> Self {
        match engine.gravity {
            GravityConfig::Basic => Self::new().with(NewtonianGravity {
                g: params.g,
                eps2: params.eps2,
            }),
            GravityConfig::Tree => Self::new().with(NewtonianGravityBarnesHut {
                g: params.g,
                eps2: params.eps2,
                theta: engine.theta,
                box_size: engine.tree_bounds(),
            }),
        }
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System, out: &mut [NVec3]) {
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, sys, out);
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Acceleration source operating on [`System`].
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, sys: &System, out: &mut [NVec3]);
}

/// Newtonian gravity with Plummer softening (direct n^2 sum)
pub struct NewtonianGravity {
    pub g: f64, // gravitational constant
    pub eps2: f64, // softening
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec3]) {
        let n = sys.bodies.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];

            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // r points from i to j: i is pulled along +r, j along -r
                let r = bj.x - bi.x;
                let d2 = r.dot(&r) + self.eps2;
                if d2 == 0.0 {
                    continue;
                }

                let inv_r = d2.sqrt().recip();
                let coef = self.g * inv_r * inv_r * inv_r;

                // a_i +=  G m_j r / |r|^3
                // a_j += -G m_i r / |r|^3
                out[i] += coef * bj.m * r;
                out[j] -= coef * bi.m * r;
            }
        }
    }
}

/// Newtonian gravity evaluated via a Barnes–Hut octree
/// Wraps [`BarnesHutTree`] to get approximate O(N log N) accelerations
/// controlled by `theta` (opening angle) and `eps2` (softening).
/// With `box_size` set the root cell is the fixed cube centred on the origin.
pub struct NewtonianGravityBarnesHut {
    pub g: f64,
    pub eps2: f64,
    pub theta: f64,
    pub box_size: Option<f64>,
}

impl Acceleration for NewtonianGravityBarnesHut {
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec3]) {
        let tree = BarnesHutTree::build(sys, self.box_size);
        for (i, a) in out.iter_mut().enumerate().take(sys.bodies.len()) {
            *a += tree.force_on_body(i, sys, self.g, self.eps2, self.theta);
        }
    }
}
