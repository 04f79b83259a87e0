//! Output files of a run
//!
//! All text outputs are space-delimited. Files are opened and closed around
//! each write so a crash loses at most the write in progress.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::simulation::context::Simulation;
use crate::simulation::states::{Body, NVec3};

/// Fixed name of the initial Cartesian state file
pub const INIT_DISK: &str = "init_disk";

/// Per-run file names, namespaced by the run tag
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub tag: String,
    pub archive: PathBuf, // <name>_<tag>.bin
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>, name: &str, tag: &str) -> Self {
        let dir = dir.into();
        let archive = dir.join(format!("{name}_{tag}.bin"));
        Self {
            dir,
            tag: tag.to_string(),
            archive,
        }
    }

    /// Sibling of the archive with `.bin` replaced by `suffix`
    pub fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .archive
            .file_name()
            .map(|n| n.to_string_lossy().replace(".bin", suffix))
            .unwrap_or_else(|| suffix.to_string());
        self.dir.join(name)
    }

    pub fn init_disk(&self) -> PathBuf {
        self.dir.join(INIT_DISK)
    }

    pub fn tde(&self) -> PathBuf {
        self.sibling("_tde")
    }

    pub fn energy(&self) -> PathBuf {
        self.sibling("_en")
    }

    pub fn binaries(&self) -> PathBuf {
        self.sibling("_bins")
    }

    pub fn dispersion(&self) -> PathBuf {
        self.sibling("_sigs_low")
    }

    pub fn masses(&self) -> PathBuf {
        self.sibling("_masses")
    }

    /// Series table for one quantity: `<quantity>_<tag>.txt`
    pub fn series(&self, quantity: &str) -> PathBuf {
        self.dir.join(format!("{quantity}_{}.txt", self.tag))
    }

    /// Series checkpoint snapshot: `simOrbit_<tag>_<i>.bin`
    pub fn checkpoint(&self, sample: usize) -> PathBuf {
        self.dir.join(format!("simOrbit_{}_{sample}.bin", self.tag))
    }
}

/// Write x y z vx vy vz m for every body, one body per line
pub fn write_init_disk(path: &Path, sim: &Simulation) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for b in sim.bodies() {
        writeln!(
            w,
            "{:.16e} {:.16e} {:.16e} {:.16e} {:.16e} {:.16e} {:.16e}",
            b.x.x, b.x.y, b.x.z, b.v.x, b.v.y, b.v.z, b.m
        )?;
    }
    w.flush()
}

/// Append one line, creating the file if needed
pub fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{line}")
}

/// Append raw text without a newline
pub fn append_text(path: &Path, text: &str) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(text.as_bytes())
}

/// Record one tidal disruption: `t a e index TDE!`
pub fn log_tde(path: &Path, t: f64, a: f64, e: f64, index: usize) -> std::io::Result<()> {
    append_line(path, &format!("{t} {a} {e} {index} TDE!"))
}

/// Rewrite a star x time table, one row per star
pub fn write_table(path: &Path, table: &DMatrix<f64>) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for row in table.row_iter() {
        let line = row.iter().map(|x| format!("{x:.18e}")).collect::<Vec<_>>().join(" ");
        writeln!(w, "{line}")?;
    }
    w.flush()
}

/// Rewrite a single column of values, one per line
pub fn write_column(path: &Path, values: &[f64]) -> std::io::Result<()> {
    let text: String = values.iter().map(|x| format!("{x:.18e}\n")).collect();
    fs::write(path, text)
}

/// Stars at or below the median stellar mass
pub fn light_stars(sim: &Simulation) -> Vec<&Body> {
    let stars = sim.bodies().get(1..).unwrap_or_default();
    let mut masses: Vec<f64> = stars.iter().map(|b| b.m).collect();
    masses.sort_by(f64::total_cmp);
    match masses.get(masses.len() / 2) {
        Some(&median) => stars.iter().filter(|b| b.m <= median).collect(),
        None => Vec::new(),
    }
}

/// Per-axis velocity dispersion of the light stars. `None` with fewer than
/// two light stars.
pub fn light_dispersion(sim: &Simulation) -> Option<NVec3> {
    let light: Vec<NVec3> = light_stars(sim).iter().map(|b| b.v).collect();
    if light.len() < 2 {
        return None;
    }
    let n = light.len() as f64;
    let mean = light.iter().fold(NVec3::zeros(), |acc, v| acc + v) / n;
    let var = light
        .iter()
        .fold(NVec3::zeros(), |acc, v| acc + (v - mean).component_mul(&(v - mean)))
        / n;
    Some(var.map(f64::sqrt))
}
