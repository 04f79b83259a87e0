//! Run drivers
//!
//! `run_archive` writes periodic snapshots plus binary and dispersion side
//! files for the analysis; `run_series` records per-star orbital elements
//! and Cartesian state on a fixed time grid.

use std::f64::consts::{PI, TAU};
use std::path::PathBuf;

use log::{debug, info, warn};
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::configuration::config::RunConfig;
use crate::error::Result;
use crate::run::output::{
    append_line, append_text, light_dispersion, light_stars, log_tde, write_column, write_init_disk, write_table,
    OutputPaths,
};
use crate::simulation::context::{Simulation, StepEvent};
use crate::simulation::populations::truncate_to_targets;
use crate::simulation::pruning::prune_binaries;
use crate::simulation::scenario::Scenario;
use crate::simulation::snapshot::SnapshotArchive;
use crate::simulation::states::ParticleId;

/// Table names of the quantities recorded per star by the series driver,
/// in table order
pub const SERIES_QUANTITIES: [&str; 12] = [
    "semimajor_axis",
    "eccentricity",
    "inclination",
    "Omega",
    "ommega",
    "mean_anomaly",
    "x",
    "y",
    "z",
    "vx",
    "vy",
    "vz",
];

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub out_dir: PathBuf,
    pub seed: Option<u64>, // overrides the config seed
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tag: String,
    pub paths: OutputPaths,
    pub stars: usize,      // stars when the production run started
    pub pruned: usize,     // removed as binaries
    pub truncated: usize,  // removed to bring populations back to N
    pub tde_events: usize,
    pub energy_error: f64, // |E_end - E_start| / |E_start|
}

fn make_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn relative_error(start: f64, end: f64) -> f64 {
    if start == 0.0 {
        (end - start).abs()
    } else {
        ((end - start) / start).abs()
    }
}

/// Build, recenter, write `init_disk` and prune. Shared by both drivers.
fn prepare(cfg: &RunConfig, options: &RunOptions, paths: &OutputPaths) -> Result<(Scenario, usize)> {
    let mut rng = make_rng(options.seed.or(cfg.params.seed));

    let mut scenario = Scenario::build(cfg, &mut rng);
    scenario.simulation.move_to_com();
    write_init_disk(&paths.init_disk(), &scenario.simulation)?;

    let pruned = if cfg.params.keep_bins {
        info!("keeping primordial binaries");
        0
    } else {
        prune_binaries(
            &mut scenario.simulation,
            &mut scenario.populations,
            cfg.params.prune_max_rounds,
        )?
        .removed
    };
    Ok((scenario, pruned))
}

/// Log every event of one `integrate` call. Collisions with the central
/// object are tidal disruptions. Returns the number of disruptions.
fn record_events(events: &[StepEvent], paths: &OutputPaths) -> Result<usize> {
    let mut tdes = 0;
    for event in events {
        match event {
            StepEvent::Collision(c) if c.index_a == 0 => {
                log_tde(
                    &paths.tde(),
                    c.t,
                    c.orbit.semi_major_axis,
                    c.orbit.eccentricity,
                    c.index_b,
                )?;
                debug!("TDE at t = {}: body {} (a = {})", c.t, c.index_b, c.orbit.semi_major_axis);
                tdes += 1;
            }
            StepEvent::Collision(c) => {
                debug!("collision at t = {} between {} and {}", c.t, c.index_a, c.index_b);
            }
            StepEvent::Escape { t, id, index } => {
                warn!("body {index} (id {}) left the box at t = {t}", id.0);
            }
        }
    }
    Ok(tdes)
}

fn energy_header(sim: &Simulation) -> String {
    let engine = sim.engine();
    format!("{}_{}_{}", engine.gravity, engine.integrator, sim.parameters().dt)
}

/// Archive driver: snapshot every π·pOut until pRun orbits have elapsed
pub fn run_archive(cfg: &RunConfig, options: &RunOptions) -> Result<RunSummary> {
    let p = &cfg.params;
    let tag = Uuid::new_v4().to_string();
    let paths = OutputPaths::new(&options.out_dir, &p.name, &tag);
    info!("archive run {tag} -> {}", paths.archive.display());

    let (mut scenario, pruned) = prepare(cfg, options, &paths)?;
    let truncated = truncate_to_targets(&mut scenario.simulation, &mut scenario.populations);
    let sim = &mut scenario.simulation;

    let light = light_stars(sim).len();
    info!("{} stars after pruning ({} light)", sim.len() - 1, light);
    sim.move_to_com();

    append_text(&paths.energy(), &energy_header(sim))?;
    let en = sim.energy();

    let archive = SnapshotArchive::create(&paths.archive)?;
    let masses: Vec<f64> = sim.bodies().iter().skip(1).map(|b| b.m).collect();
    write_column(&paths.masses(), &masses)?;

    let interval = PI * p.p_out;
    let t_end = p.p_run * TAU;
    let stars = sim.len() - 1;
    let mut tde_events = 0;
    let mut k = 0usize;
    loop {
        // the last snapshot lands exactly on t_end
        let t = match k as f64 * interval {
            t if t >= t_end * (1.0 - 1e-12) => t_end,
            t => t,
        };
        let events = sim.integrate(t);
        tde_events += record_events(&events, &paths)?;
        archive_sample(sim, &archive, &paths)?;
        debug!("snapshot {k} at t = {t}, {} bodies", sim.len());

        if t >= t_end {
            break;
        }
        k += 1;
    }

    let en2 = sim.energy();
    let energy_error = relative_error(en, en2);
    append_line(&paths.energy(), &format!("_{energy_error:.3e}"))?;
    info!("archive run {tag} done: energy error {energy_error:.3e}, {tde_events} TDEs");

    Ok(RunSummary {
        tag,
        paths,
        stars,
        pruned,
        truncated,
        tde_events,
        energy_error,
    })
}

/// Snapshot plus the binary and dispersion rows at the current time
fn archive_sample(sim: &Simulation, archive: &SnapshotArchive, paths: &OutputPaths) -> Result<()> {
    archive.append(&sim.snapshot())?;

    let pairs = sim.find_binaries();
    if !pairs.is_empty() {
        let rows = pairs.iter().map(|b| b.to_row()).collect::<Vec<_>>().join("\n");
        append_line(&paths.binaries(), &rows)?;
    }

    if let Some(sig) = light_dispersion(sim) {
        append_line(&paths.dispersion(), &format!("{} {} {} {}", sim.t(), sig.x, sig.y, sig.z))?;
    }
    Ok(())
}

/// Sample times in orbits: `linspace(0, pRun, pRun * pOut + 1)`
pub fn series_times(p_run: f64, p_out: f64) -> Vec<f64> {
    let n = ((p_run * p_out).round() as usize).max(1) + 1;
    (0..n).map(|i| p_run * i as f64 / (n - 1) as f64).collect()
}

/// Series driver: per-star tables sampled on a fixed grid of orbits
pub fn run_series(cfg: &RunConfig, options: &RunOptions) -> Result<RunSummary> {
    let p = &cfg.params;
    let tag = Uuid::new_v4().to_string();
    let paths = OutputPaths::new(&options.out_dir, &p.name, &tag);
    info!("series run {tag} in {}", paths.dir.display());

    let (mut scenario, pruned) = prepare(cfg, options, &paths)?;
    let sim = &mut scenario.simulation;
    sim.move_to_com();

    let ids: Vec<ParticleId> = sim.bodies().iter().skip(1).map(|b| b.id).collect();
    let masses: Vec<f64> = sim.bodies().iter().skip(1).map(|b| b.m).collect();
    write_column(&paths.series("masses"), &masses)?;

    let times = series_times(p.p_run, p.p_out);
    let samples = times.len();
    let mut tables: Vec<DMatrix<f64>> = SERIES_QUANTITIES
        .iter()
        .map(|_| DMatrix::from_element(ids.len(), samples, f64::NAN))
        .collect();
    let mut energy = vec![f64::NAN; samples];
    let mut ang_mom = [vec![f64::NAN; samples], vec![f64::NAN; samples], vec![f64::NAN; samples]];

    let en = sim.energy();
    let save_every = p.p_save.max(1);
    let mut tde_events = 0;

    for (i, &t_orbits) in times.iter().enumerate() {
        let events = sim.integrate(t_orbits * TAU);
        tde_events += record_events(&events, &paths)?;
        sim.move_to_com();

        let index = sim.index_map();
        for (row, id) in ids.iter().enumerate() {
            let Some(&k) = index.get(id) else { continue };
            let (Some(el), Some(b)) = (sim.orbit_of(k), sim.bodies().get(k)) else {
                continue;
            };
            let values = [
                el.semi_major_axis,
                el.eccentricity,
                el.inclination,
                el.longitude_ascending_node,
                el.argument_of_periapsis,
                el.mean_anomaly,
                b.x.x,
                b.x.y,
                b.x.z,
                b.v.x,
                b.v.y,
                b.v.z,
            ];
            for (table, value) in tables.iter_mut().zip(values) {
                table[(row, i)] = value;
            }
        }

        energy[i] = sim.energy();
        let l = sim.angular_momentum();
        for (axis, column) in ang_mom.iter_mut().enumerate() {
            column[i] = l[axis];
        }

        if i % save_every == 0 || i + 1 == samples {
            for (quantity, table) in SERIES_QUANTITIES.iter().zip(&tables) {
                write_table(&paths.series(quantity), table)?;
            }
            write_column(&paths.series("Energy"), &energy)?;
            for (axis, column) in ["x", "y", "z"].iter().zip(&ang_mom) {
                write_column(&paths.series(&format!("Angular_momentum_{axis}")), column)?;
            }
            sim.snapshot().save(&paths.checkpoint(i))?;
            debug!("series {tag}: flushed through sample {i} (t = {t_orbits} orbits)");
        }
    }

    let energy_error = relative_error(en, sim.energy());
    info!("series run {tag} done: energy error {energy_error:.3e}, {tde_events} TDEs");

    Ok(RunSummary {
        tag,
        paths,
        stars: ids.len(),
        pruned,
        truncated: 0,
        tde_events,
        energy_error,
    })
}
