//! Number of light-light binaries against time, compared with the analytic
//! estimate for a disk with an r^-3 surface density between r = 1 and 2.
//!
//! Inputs per run, next to `<base>/<name>` (an archive file name):
//! - `_bins`:     t i1 i2 separation a e, one row per bound pair per snapshot
//! - `_sigs_low`: t sx sy sz, light-star velocity dispersion per snapshot
//! - `_masses`:   stellar masses in index order (central object excluded)

use std::f64::consts::{PI, TAU};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::analysis::interp::LinearInterp;
use crate::analysis::plot::{plot_counts, PlotStyle};
use crate::analysis::AnalysisError;

pub const NAMES_FILE: &str = "names";
pub const OUTPUT_STEM: &str = "num_bins_light";

/// Relative tolerance for matching binary rows to snapshot times
const TIME_RTOL: f64 = 1.0e-12;

/// Expected number of binaries among `num` stars of mass `m` with velocity
/// dispersion `v`. Zero for `num = 0`.
pub fn num_analytic(num: usize, v: f64, m: f64) -> f64 {
    if num == 0 {
        return 0.0;
    }
    // normalization of the r^-3 profile for a single star
    let norm = 0.32;
    let r1 = 1.2;
    let rh = (m / 3.0).cbrt() * r1;
    let vh = rh * r1.powf(-1.5);
    let num = num as f64;

    (7.0 / 8.0) * (TAU / 3.0) / PI * num * num * norm * (4.0 * PI / 3.0) * rh * rh * (v / vh).powi(-4)
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub mass: f64,   // stellar mass for the analytic estimate
    pub tmax: f64,   // orbits
    pub ymax: f64,
    pub mheavy: f64, // masses above this are heavy
    pub col1: String, // simulation curve
    pub col2: String, // analytic curve
}

impl AnalysisOptions {
    pub fn new(mass: f64) -> Self {
        Self {
            mass,
            tmax: 20.0,
            ymax: 20.0,
            mheavy: 1.0e-4,
            col1: "black".into(),
            col2: "red".into(),
        }
    }
}

/// Side files of one archive run
#[derive(Debug, Clone, Default)]
pub struct RunTables {
    pub bins: Vec<Vec<f64>>,
    pub sigs: Vec<Vec<f64>>,
    pub masses: Vec<f64>,
}

/// Counts of one run on its own snapshot times
#[derive(Debug, Clone, PartialEq)]
pub struct RunCounts {
    pub ts: Vec<f64>,
    pub simulated: Vec<f64>,
    pub analytic: Vec<f64>,
}

/// Mean and spread across runs on the standard grid
#[derive(Debug, Clone)]
pub struct CountSummary {
    pub t_std: Vec<f64>,
    pub runs: usize,
    pub sim_mean: Vec<f64>,
    pub sim_std: Vec<f64>,
    pub analytic_mean: Vec<f64>,
    pub analytic_std: Vec<f64>,
}

/// Whitespace-separated numeric table; blank and `#` lines are skipped
pub fn parse_table(text: &str, path: &Path) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|field| {
                field.parse::<f64>().map_err(|_| AnalysisError::Parse {
                    path: path.to_path_buf(),
                    line: lineno + 1,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_table(path: &Path) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let text = fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&text, path)
}

/// Side file of an archive: `name.bin` -> `name<suffix>`
pub fn side_file(base: &Path, name: &str, suffix: &str) -> PathBuf {
    base.join(name.replace(".bin", suffix))
}

impl RunTables {
    /// Load a run's side files. A missing `_bins` file means no binaries
    /// were ever found.
    pub fn load(base: &Path, name: &str) -> Result<Self, AnalysisError> {
        let bins_path = side_file(base, name, "_bins");
        let bins = match fs::read_to_string(&bins_path) {
            Ok(text) => parse_table(&text, &bins_path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(AnalysisError::Io { path: bins_path, source }),
        };
        let sigs = load_table(&side_file(base, name, "_sigs_low"))?;
        let masses = load_table(&side_file(base, name, "_masses"))?
            .into_iter()
            .flatten()
            .collect();
        Ok(Self { bins, sigs, masses })
    }
}

/// Body index of the first heavy star; every star below it is light. With no
/// heavy star all stars are light.
pub fn light_index(masses: &[f64], mheavy: f64) -> usize {
    masses.iter().position(|&m| m > mheavy).unwrap_or(masses.len()) + 1
}

/// Whether `a` matches `b` to within `rtol * |b|`
fn is_close(a: f64, b: f64, rtol: f64) -> bool {
    (a - b).abs() <= rtol * b.abs()
}

/// Light-light binaries above the hardness threshold at each snapshot time
pub fn count_light_binaries(tables: &RunTables, opts: &AnalysisOptions) -> Result<RunCounts, AnalysisError> {
    let ts: Vec<f64> = tables.sigs.iter().filter_map(|r| r.first().copied()).collect();
    let vs: Vec<f64> = tables.sigs.iter().filter_map(|r| r.get(3).copied()).collect();
    if vs.len() != ts.len() {
        return Err(AnalysisError::Interp("dispersion rows without a z column".into()));
    }
    let v_of_t = LinearInterp::new(ts.clone(), vs.clone())?;

    let idx = light_index(&tables.masses, opts.mheavy);
    let light_pairs = tables.bins.iter().filter(|row| {
        row.len() >= 5 && (row[1] as usize) < idx && (row[2] as usize) < idx
    });

    // pairs wider than 2 m / v^2 at their own time
    let kept: Vec<f64> = light_pairs
        .filter(|row| {
            let v = v_of_t.eval(row[0]);
            row[4] >= 2.0 * opts.mass / (v * v)
        })
        .map(|row| row[0])
        .collect();

    let simulated = ts
        .iter()
        .map(|&t| kept.iter().filter(|&&tb| is_close(tb, t, TIME_RTOL)).count() as f64)
        .collect();

    let n_light = tables.masses.iter().filter(|&&m| m < opts.mheavy).count();
    let analytic = vs.iter().map(|&v| num_analytic(n_light, v, opts.mass)).collect();

    Ok(RunCounts { ts, simulated, analytic })
}

/// Common time grid: `arange(1e-14, 1.01 tmax 2π, 0.2π)`
pub fn standard_grid(tmax: f64) -> Vec<f64> {
    let start = 1.0e-14;
    let stop = 1.01 * tmax * TAU;
    let step = 0.2 * PI;
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

fn mean_std(columns: &[Vec<f64>], len: usize) -> (Vec<f64>, Vec<f64>) {
    let n = columns.len() as f64;
    (0..len)
        .map(|j| {
            let mean = columns.iter().map(|c| c[j]).sum::<f64>() / n;
            let var = columns.iter().map(|c| (c[j] - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        })
        .unzip()
}

/// Resample every run onto the standard grid and average. Runs shorter than
/// `10.01 * tmax` snapshots are left out.
pub fn aggregate(runs: &[RunCounts], tmax: f64) -> Result<CountSummary, AnalysisError> {
    let t_std = standard_grid(tmax);
    let mut simulated = Vec::new();
    let mut analytic = Vec::new();

    for run in runs {
        if (run.ts.len() as f64) < 10.01 * tmax {
            warn!("skipping run with {} snapshots (tmax = {tmax})", run.ts.len());
            continue;
        }
        simulated.push(LinearInterp::new(run.ts.clone(), run.simulated.clone())?.eval_many(&t_std));
        analytic.push(LinearInterp::new(run.ts.clone(), run.analytic.clone())?.eval_many(&t_std));
    }
    if simulated.is_empty() {
        return Err(AnalysisError::NoRuns);
    }

    let (sim_mean, sim_std) = mean_std(&simulated, t_std.len());
    let (analytic_mean, analytic_std) = mean_std(&analytic, t_std.len());
    Ok(CountSummary {
        t_std,
        runs: simulated.len(),
        sim_mean,
        sim_std,
        analytic_mean,
        analytic_std,
    })
}

/// Run names listed in `<base>/names`, whitespace separated
pub fn read_names(base: &Path) -> Result<Vec<String>, AnalysisError> {
    let path = base.join(NAMES_FILE);
    let text = fs::read_to_string(&path).map_err(|source| AnalysisError::Io { path, source })?;
    Ok(text.split_whitespace().map(str::to_string).collect())
}

pub fn write_summary(path: &Path, summary: &CountSummary) -> Result<(), AnalysisError> {
    let mut text = String::from("# t_orbits sim_mean sim_std analytic_mean analytic_std\n");
    for j in 0..summary.t_std.len() {
        text.push_str(&format!(
            "{:.10e} {:.10e} {:.10e} {:.10e} {:.10e}\n",
            summary.t_std[j] / TAU,
            summary.sim_mean[j],
            summary.sim_std[j],
            summary.analytic_mean[j],
            summary.analytic_std[j]
        ));
    }
    fs::write(path, text).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Full analysis of the runs under `base`: writes `num_bins_light.dat` and
/// `num_bins_light.svg` there.
pub fn analyze(base: &Path, opts: &AnalysisOptions) -> Result<CountSummary, AnalysisError> {
    let names = read_names(base)?;
    info!("analyzing {} runs under {}", names.len(), base.display());

    let mut runs = Vec::new();
    for name in &names {
        let counts = RunTables::load(base, name).and_then(|tables| count_light_binaries(&tables, opts));
        match counts {
            Ok(counts) => {
                debug!("{name}: {} snapshots", counts.ts.len());
                runs.push(counts);
            }
            Err(e) => warn!("skipping {name}: {e}"),
        }
    }

    let summary = aggregate(&runs, opts.tmax)?;
    write_summary(&base.join(format!("{OUTPUT_STEM}.dat")), &summary)?;

    let style = PlotStyle {
        tmax: opts.tmax,
        ymax: opts.ymax,
        sim_color: opts.col1.clone(),
        analytic_color: opts.col2.clone(),
    };
    plot_counts(&base.join(format!("{OUTPUT_STEM}.svg")), &summary, &style)?;

    info!("averaged {} of {} runs", summary.runs, names.len());
    Ok(summary)
}
