//! Snapshots of the full simulation state
//!
//! A snapshot is a bincode-encoded copy of the engine settings, parameters
//! and bodies. Single checkpoints are one snapshot per file; an archive is a
//! file of length-prefixed snapshots appended over the course of a run.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::simulation::engine::Engine;
use crate::simulation::params::Parameters;
use crate::simulation::states::System;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    pub next_id: u64,
}

impl Snapshot {
    /// Write this snapshot as a single-snapshot file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a single-snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Append-only archive of snapshots
#[derive(Debug, Clone)]
pub struct SnapshotArchive {
    path: PathBuf,
}

impl SnapshotArchive {
    /// Start a fresh archive, replacing any existing file
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::create(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot (u64 little-endian length, then the payload)
    pub fn append(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = bincode::serialize(snapshot)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(&(bytes.len() as u64).to_le_bytes())?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Read every snapshot in an archive file. A length prefix running past
    /// the end of the file is an `InvalidData` error.
    pub fn read_all(path: &Path) -> Result<Vec<Snapshot>> {
        let file = File::open(path)?;
        let mut remaining = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut snapshots = Vec::new();
        loop {
            let mut len = [0u8; 8];
            match reader.read_exact(&mut len) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            remaining = remaining.saturating_sub(8);
            let len = u64::from_le_bytes(len);
            if len > remaining {
                return Err(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("snapshot of {len} bytes with {remaining} bytes left in {}", path.display()),
                )
                .into());
            }
            remaining -= len;
            let mut buf = vec![0u8; len as usize];
            reader.read_exact(&mut buf)?;
            snapshots.push(bincode::deserialize(&buf)?);
        }
        Ok(snapshots)
    }
}
