//! The simulation context
//!
//! `Simulation` owns the bodies, engine settings and parameters, and exposes
//! every mutation explicitly: adding and removing particles, integrating,
//! recentering. Integration returns the events that happened along the way
//! instead of calling back into user code.

use std::collections::HashMap;

use log::debug;

use crate::configuration::config::{CollisionConfig, IntegratorConfig};
use crate::simulation::binaries::{find_binaries, BinaryPair};
use crate::simulation::collisions::{self, Collision};
use crate::simulation::engine::{Boundary, Engine};
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::{leapfrog, verlet};
use crate::simulation::orbits::{cartesian_to_orbital_elements, orbital_elements_to_cartesian, OrbitalElements};
use crate::simulation::params::{Parameters, DEFAULT_DT};
use crate::simulation::snapshot::Snapshot;
use crate::simulation::states::{Body, NVec3, ParticleId, System};

/// Something that happened during `integrate`
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Collision(Collision),
    /// Body left the open boundary and was removed
    Escape { t: f64, id: ParticleId, index: usize },
}

pub struct Simulation {
    pub system: System,
    engine: Engine,
    parameters: Parameters,
    forces: AccelSet,
    next_id: u64,
}

impl Simulation {
    pub fn new(engine: Engine, parameters: Parameters) -> Self {
        let forces = AccelSet::from_engine(&engine, &parameters);
        Self {
            system: System::default(),
            engine,
            parameters,
            forces,
            next_id: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn t(&self) -> f64 {
        self.system.t
    }

    pub fn len(&self) -> usize {
        self.system.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.system.bodies
    }

    /// Add a body from its Cartesian state
    pub fn add(&mut self, m: f64, radius: f64, x: NVec3, v: NVec3) -> ParticleId {
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.system.bodies.push(Body { id, x, v, m, radius });
        id
    }

    /// Add a body on the orbit `elements` around the body at `primary`.
    /// Returns `None` when `primary` is out of range.
    pub fn add_orbiting(&mut self, m: f64, radius: f64, elements: &OrbitalElements, primary: usize) -> Option<ParticleId> {
        let p = self.system.bodies.get(primary)?;
        let mu = self.parameters.g * (p.m + m);
        let (dx, dv) = orbital_elements_to_cartesian(mu, elements);
        let (x, v) = (p.x + dx, p.v + dv);
        Some(self.add(m, radius, x, v))
    }

    /// Remove the body at `index`; higher indices shift down by one
    pub fn remove(&mut self, index: usize) -> Option<Body> {
        if index < self.system.bodies.len() {
            Some(self.system.bodies.remove(index))
        } else {
            None
        }
    }

    pub fn remove_id(&mut self, id: ParticleId) -> Option<Body> {
        let index = self.index_of(id)?;
        self.remove(index)
    }

    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.system.bodies.iter().position(|b| b.id == id)
    }

    /// Current positional index of every body, keyed by id
    pub fn index_map(&self) -> HashMap<ParticleId, usize> {
        self.system.bodies.iter().enumerate().map(|(i, b)| (b.id, i)).collect()
    }

    /// Integrate forward until `t_target`, landing on it exactly.
    pub fn integrate(&mut self, t_target: f64) -> Vec<StepEvent> {
        let mut events = Vec::new();
        let step = if self.parameters.dt > 0.0 { self.parameters.dt } else { DEFAULT_DT };

        while self.system.t < t_target {
            let remaining = t_target - self.system.t;
            let last = remaining <= step;
            let dt = if last { remaining } else { step };

            let before = match self.engine.collision {
                CollisionConfig::Line => self.system.positions(),
                _ => Vec::new(),
            };

            match self.engine.integrator {
                IntegratorConfig::Verlet => verlet(&mut self.system, &self.forces, dt),
                IntegratorConfig::Leapfrog => leapfrog(&mut self.system, &self.forces, dt),
            }
            if last {
                self.system.t = t_target;
            }

            events.extend(
                collisions::detect(self.engine.collision, &before, &self.system, self.parameters.g)
                    .into_iter()
                    .map(StepEvent::Collision),
            );
            events.extend(self.apply_boundary());
        }

        if !events.is_empty() {
            debug!("integrate to t = {t_target}: {} events", events.len());
        }
        events
    }

    /// Remove bodies outside an open boundary; the central object stays.
    fn apply_boundary(&mut self) -> Vec<StepEvent> {
        let Boundary::Open { size } = self.engine.boundary else {
            return Vec::new();
        };
        let half = 0.5 * size;
        let mut events = Vec::new();
        let mut index = 1;
        while index < self.system.bodies.len() {
            let b = &self.system.bodies[index];
            if b.x.iter().any(|c| c.abs() > half) {
                events.push(StepEvent::Escape {
                    t: self.system.t,
                    id: b.id,
                    index,
                });
                self.system.bodies.remove(index);
            } else {
                index += 1;
            }
        }
        events
    }

    /// Shift positions and velocities so the center of mass is at rest at
    /// the origin
    pub fn move_to_com(&mut self) {
        let (x_com, v_com) = self.system.center_of_mass();
        for b in self.system.bodies.iter_mut() {
            b.x -= x_com;
            b.v -= v_com;
        }
    }

    /// Total energy, kinetic plus (softened) pairwise potential
    pub fn energy(&self) -> f64 {
        let bodies = &self.system.bodies;
        let mut kinetic = 0.0;
        let mut potential = 0.0;
        for (i, bi) in bodies.iter().enumerate() {
            kinetic += 0.5 * bi.m * bi.v.norm_squared();
            for bj in &bodies[i + 1..] {
                let d = ((bj.x - bi.x).norm_squared() + self.parameters.eps2).sqrt();
                if d > 0.0 {
                    potential -= self.parameters.g * bi.m * bj.m / d;
                }
            }
        }
        kinetic + potential
    }

    /// Total angular momentum about the origin
    pub fn angular_momentum(&self) -> NVec3 {
        self.system
            .bodies
            .iter()
            .fold(NVec3::zeros(), |acc, b| acc + b.m * b.x.cross(&b.v))
    }

    /// Orbit of the body at `index` around the central object (index 0)
    pub fn orbit_of(&self, index: usize) -> Option<OrbitalElements> {
        if index == 0 {
            return None;
        }
        let primary = self.system.bodies.first()?;
        let b = self.system.bodies.get(index)?;
        let mu = self.parameters.g * (primary.m + b.m);
        Some(cartesian_to_orbital_elements(mu, b.x - primary.x, b.v - primary.v))
    }

    /// Orbits of every body except the central object, in index order
    pub fn orbits(&self) -> Vec<OrbitalElements> {
        (1..self.len()).filter_map(|i| self.orbit_of(i)).collect()
    }

    /// Bound star pairs at the current state
    pub fn find_binaries(&self) -> Vec<BinaryPair> {
        find_binaries(&self.system, self.parameters.g)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            engine: self.engine.clone(),
            parameters: self.parameters.clone(),
            system: self.system.clone(),
            next_id: self.next_id,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let forces = AccelSet::from_engine(&snapshot.engine, &snapshot.parameters);
        Self {
            system: snapshot.system,
            engine: snapshot.engine,
            parameters: snapshot.parameters,
            forces,
            next_id: snapshot.next_id,
        }
    }
}
