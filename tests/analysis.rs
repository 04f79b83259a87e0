use std::f64::consts::{PI, TAU};
use std::fs;
use std::path::Path;

use approx::assert_relative_eq;

use nucdisk::analysis::binary_counts::{
    aggregate, analyze, count_light_binaries, light_index, num_analytic, standard_grid, AnalysisOptions, RunCounts,
    RunTables,
};
use nucdisk::analysis::interp::LinearInterp;
use nucdisk::analysis::plot::parse_color;
use nucdisk::analysis::AnalysisError;

#[test]
fn analytic_estimate_vanishes_without_stars() {
    assert_eq!(num_analytic(0, 0.1, 5e-5), 0.0);
    assert_eq!(num_analytic(0, 0.0, 5e-5), 0.0);
}

#[test]
fn analytic_estimate_scaling() {
    let base = num_analytic(100, 0.05, 5e-5);
    assert!(base > 0.0);
    assert_relative_eq!(num_analytic(200, 0.05, 5e-5), 4.0 * base, max_relative = 1e-12);
    assert_relative_eq!(num_analytic(100, 0.1, 5e-5), base / 16.0, max_relative = 1e-12);
}

#[test]
fn analytic_estimate_reference_value() {
    let m: f64 = 5e-5;
    let rh = (m / 3.0).cbrt() * 1.2;
    let vh = rh * 1.2f64.powf(-1.5);
    // v = vh leaves only the prefactor
    let expected = (7.0 / 8.0) * (2.0 / 3.0) * 0.32 * (4.0 * PI / 3.0) * rh * rh;
    assert_relative_eq!(num_analytic(1, vh, m), expected, max_relative = 1e-12);
}

#[test]
fn interpolation_extends_the_end_segments() {
    let f = LinearInterp::new(vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 4.0]).unwrap();
    assert_relative_eq!(f.eval(0.5), 1.0);
    assert_relative_eq!(f.eval(2.0), 3.0);
    assert_relative_eq!(f.eval(1.0), 2.0);
    assert_relative_eq!(f.eval(-1.0), -2.0);
    assert_relative_eq!(f.eval(5.0), 6.0);
}

#[test]
fn interpolation_rejects_bad_tables() {
    assert!(matches!(LinearInterp::new(vec![0.0], vec![1.0]), Err(AnalysisError::Interp(_))));
    assert!(matches!(LinearInterp::new(vec![0.0, 0.0], vec![1.0, 2.0]), Err(AnalysisError::Interp(_))));
    assert!(matches!(LinearInterp::new(vec![0.0, 1.0], vec![1.0]), Err(AnalysisError::Interp(_))));
}

#[test]
fn light_index_marks_the_first_heavy_star() {
    assert_eq!(light_index(&[5e-5, 5e-5, 5e-4, 5e-4], 1e-4), 3);
    assert_eq!(light_index(&[5e-5, 5e-5], 1e-4), 3);
}

#[test]
fn standard_grid_spacing() {
    let grid = standard_grid(1.0);
    assert_relative_eq!(grid[0], 1e-14);
    assert_relative_eq!(grid[1] - grid[0], 0.2 * PI, epsilon = 1e-12);
    assert!(*grid.last().unwrap() < 1.01 * TAU);
    assert_eq!(grid.len(), 11);
}

fn sample_tables() -> RunTables {
    let ts = [0.0, 1.0, 2.0];
    RunTables {
        sigs: ts.iter().map(|&t| vec![t, 0.1, 0.1, 0.1]).collect(),
        // two light stars, then a heavy one at index 3
        masses: vec![5e-5, 5e-5, 5e-4],
        bins: vec![
            vec![1.0, 1.0, 2.0, 0.01, 0.02, 0.1],  // light-light, wide enough
            vec![1.0, 1.0, 3.0, 0.01, 0.02, 0.1],  // involves the heavy star
            vec![2.0, 1.0, 2.0, 0.001, 0.005, 0.1], // below 2 m / v^2 = 0.01
            vec![2.0, 1.0, 2.0, 0.01, 0.05, 0.1],
            vec![2.0, 1.0, 2.0, 0.01, 0.05, 0.1],
        ],
    }
}

#[test]
fn counts_only_hard_light_binaries() {
    let counts = count_light_binaries(&sample_tables(), &AnalysisOptions::new(5e-5)).unwrap();
    assert_eq!(counts.ts, vec![0.0, 1.0, 2.0]);
    assert_eq!(counts.simulated, vec![0.0, 1.0, 2.0]);
    let expected = num_analytic(2, 0.1, 5e-5);
    assert!(counts.analytic.iter().all(|&a| (a - expected).abs() <= 1e-12 * expected));
}

#[test]
fn aggregate_skips_short_runs_and_averages() {
    let n = 25;
    let ts: Vec<f64> = (0..n).map(|i| i as f64 * 0.2 * PI).collect();
    let run = |level: f64| RunCounts {
        ts: ts.clone(),
        simulated: vec![level; n],
        analytic: vec![2.0 * level; n],
    };
    let short = RunCounts {
        ts: ts[..5].to_vec(),
        simulated: vec![100.0; 5],
        analytic: vec![100.0; 5],
    };

    let summary = aggregate(&[run(1.0), run(3.0), short], 2.0).unwrap();
    assert_eq!(summary.runs, 2);
    assert!(summary.sim_mean.iter().all(|&m| (m - 2.0).abs() < 1e-12));
    assert!(summary.sim_std.iter().all(|&s| (s - 1.0).abs() < 1e-12));
    assert!(summary.analytic_mean.iter().all(|&m| (m - 4.0).abs() < 1e-12));
}

#[test]
fn aggregate_without_long_runs_fails() {
    let short = RunCounts {
        ts: vec![0.0, 1.0],
        simulated: vec![0.0, 0.0],
        analytic: vec![0.0, 0.0],
    };
    assert!(matches!(aggregate(&[short], 20.0), Err(AnalysisError::NoRuns)));
}

#[test]
fn colors_by_name_and_hex() {
    assert!(parse_color("black").is_some());
    assert!(parse_color("Red").is_some());
    assert_eq!(parse_color("#ff8000").map(|c| (c.0, c.1, c.2)), Some((255, 128, 0)));
    assert!(parse_color("chartreuse-ish").is_none());
}

fn write_run(base: &Path, name: &str, snapshots: usize) {
    let stem = name.replace(".bin", "");
    let mut sigs = String::new();
    let mut bins = String::new();
    for k in 0..snapshots {
        let t = k as f64 * 0.2 * PI;
        sigs.push_str(&format!("{t} 0.05 0.05 0.05\n"));
        for _ in 0..(k % 3) {
            bins.push_str(&format!("{t:.16e} 1 2 0.01 0.1 0.2\n"));
        }
    }
    fs::write(base.join(format!("{stem}_sigs_low")), sigs).unwrap();
    fs::write(base.join(format!("{stem}_bins")), bins).unwrap();
    fs::write(base.join(format!("{stem}_masses")), "5e-5\n5e-5\n5e-5\n").unwrap();
}

#[test]
fn full_analysis_writes_table_and_plot() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    write_run(base, "a_1.bin", 40);
    write_run(base, "a_2.bin", 40);
    // missing side files: skipped with a warning
    fs::write(base.join("names"), "a_1.bin\na_2.bin\nmissing.bin\n").unwrap();

    let mut opts = AnalysisOptions::new(5e-5);
    opts.tmax = 2.0;
    let summary = analyze(base, &opts).unwrap();

    assert_eq!(summary.runs, 2);
    let table = fs::read_to_string(base.join("num_bins_light.dat")).unwrap();
    assert_eq!(table.lines().count(), summary.t_std.len() + 1);
    let svg = fs::read_to_string(base.join("num_bins_light.svg")).unwrap();
    assert!(svg.contains("<svg"));
}
