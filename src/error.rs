use std::io;

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::configuration::config::ConfigError;
use crate::simulation::pruning::PruneError;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),
    #[error(transparent)]
    Prune(#[from] PruneError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub type Result<T> = std::result::Result<T, Error>;
