pub mod simulation;
pub mod configuration;
pub mod run;
pub mod analysis;
pub mod error;

pub use simulation::states::{Body, System, NVec3, ParticleId};
pub use simulation::context::{Simulation, StepEvent};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity, NewtonianGravityBarnesHut};
pub use simulation::integrator::{verlet, leapfrog};
pub use simulation::orbits::OrbitalElements;
pub use simulation::populations::Population;
pub use simulation::pruning::{prune_binaries, PruneError, PruneOutcome};
pub use simulation::scenario::Scenario;

pub use configuration::config::{
    CollisionConfig, ConfigError, GravityConfig, IntegratorConfig, OrientationConfig, ParamsConfig, RunConfig,
    RunMode, SectionConfig,
};

pub use run::driver::{run_archive, run_series, RunOptions, RunSummary};

pub use analysis::binary_counts::{analyze, num_analytic, AnalysisOptions};
pub use analysis::AnalysisError;

pub use error::{Error, Result};
