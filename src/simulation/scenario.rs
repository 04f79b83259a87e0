//! Build initial conditions from a run configuration
//!
//! Produces a `Scenario`: a `Simulation` holding the central object (index 0,
//! m = 1, radius = rt) followed by every population's stars, plus the
//! population bookkeeping. Each star gets
//! - a semimajor axis from the population's truncated power law,
//! - the population's eccentricity and mass,
//! - an orientation from its orientation law,
//! - a uniform mean anomaly in [0, 2π).

use std::f64::consts::TAU;

use log::{debug, info};
use rand::Rng;

use crate::configuration::config::{OrientationConfig, RunConfig, RunMode, SectionConfig};
use crate::simulation::context::Simulation;
use crate::simulation::engine::Engine;
use crate::simulation::orbits::OrbitalElements;
use crate::simulation::params::Parameters;
use crate::simulation::populations::Population;
use crate::simulation::sampling::{density, gen_disk, DiskOrientation};
use crate::simulation::states::NVec3;

/// Mass of the central object
pub const CENTRAL_MASS: f64 = 1.0;

pub struct Scenario {
    pub simulation: Simulation,
    pub populations: Vec<Population>,
}

impl Scenario {
    /// Build the central object and all populations.
    ///
    /// In archive mode each population is oversampled by `buffer`; series
    /// runs generate exactly `N` stars.
    pub fn build<R: Rng + ?Sized>(cfg: &RunConfig, rng: &mut R) -> Self {
        let p = &cfg.params;
        let engine = Engine::new(p.gravity, p.integrator, p.coll);
        let mut simulation = Simulation::new(engine, Parameters::with_dt(p.dt));

        simulation.add(CENTRAL_MASS, p.rt, NVec3::zeros(), NVec3::zeros());

        let buffer = match cfg.mode {
            RunMode::Archive => p.buffer,
            RunMode::Series => 1.0,
        };

        let populations = cfg
            .sections
            .iter()
            .map(|section| populate(&mut simulation, section, section.generated(buffer), rng))
            .collect::<Vec<_>>();

        info!(
            "built {} stars in {} populations around the central object",
            simulation.len() - 1,
            populations.len()
        );

        Self {
            simulation,
            populations,
        }
    }
}

/// Sample one orientation from a population's law
pub fn sample_orientation<R: Rng + ?Sized>(law: OrientationConfig, rng: &mut R) -> DiskOrientation {
    match law {
        OrientationConfig::Inclined { i_max } => DiskOrientation {
            inclination: rng.gen::<f64>() * i_max.to_radians(),
            node: 0.0,
            periapsis: 0.0,
        },
        OrientationConfig::Disk { ang } => gen_disk(rng, ang.to_radians()),
    }
}

/// Add `count` stars of `section` around the central object
fn populate<R: Rng + ?Sized>(sim: &mut Simulation, section: &SectionConfig, count: usize, rng: &mut R) -> Population {
    let mut population = Population::new(section.name.clone(), section.n);

    for _ in 0..count {
        let orientation = sample_orientation(section.orientation, rng);
        let a = density(rng, section.a_min, section.a_max, section.p);
        let mean_anomaly = rng.gen::<f64>() * TAU;

        let elements = OrbitalElements::new(
            a,
            section.e,
            orientation.inclination,
            orientation.node,
            orientation.periapsis,
            mean_anomaly,
        );
        // the central object is always present at index 0
        if let Some(id) = sim.add_orbiting(section.m, 0.0, &elements, 0) {
            population.members.push(id);
        }
    }

    debug!("population [{}]: {} stars (target {})", section.name, count, section.n);
    population
}
