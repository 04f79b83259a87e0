//! Post-processing of archive runs

pub mod binary_counts;
pub mod interp;
pub mod plot;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}:{line}: not a number: `{value}`")]
    Parse { path: PathBuf, line: usize, value: String },
    #[error("interpolation failed: {0}")]
    Interp(String),
    #[error("no run passed the length cut")]
    NoRuns,
    #[error("plotting failed: {0}")]
    Plot(String),
}
