pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod integrator;
pub mod barnes_hut;
pub mod collisions;
pub mod orbits;
pub mod binaries;
pub mod snapshot;
pub mod context;
pub mod sampling;
pub mod populations;
pub mod scenario;
pub mod pruning;
