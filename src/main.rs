use nucdisk::{analyze, run_archive, run_series, AnalysisOptions, RunConfig, RunMode, RunOptions};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use std::path::PathBuf;

/// Star-cluster disks around a central massive object
#[derive(Parser, Debug)]
#[command(name = "nucdisk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run file (INI, or YAML with a .yaml/.yml extension)
    #[arg(short, long, default_value = "config")]
    config: PathBuf,

    /// Directory for all outputs
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Override the configured random seed
    #[arg(short, long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snapshot archive run with binary diagnostics
    Run(RunArgs),

    /// Per-star orbital element time series
    Series(RunArgs),

    /// Average light-light binary counts over runs and plot them
    Plot {
        /// Directory holding `names` and the runs' side files
        #[arg(short, long)]
        base: PathBuf,

        /// Stellar mass used for the analytic estimate
        #[arg(short, long)]
        mass: f64,

        /// Maximum y for the plot
        #[arg(short, long, default_value_t = 20.0)]
        ymax: f64,

        /// Maximum time for the plot, in orbits
        #[arg(short, long, default_value_t = 20.0)]
        tmax: f64,

        /// Color of the simulation curve
        #[arg(long, default_value = "black")]
        col1: String,

        /// Color of the analytic curve
        #[arg(long, default_value = "red")]
        col2: String,

        /// Mass separating heavy stars from light ones
        #[arg(long, default_value_t = 1.0e-4)]
        mheavy: f64,
    },
}

fn run(args: RunArgs, mode: RunMode) -> Result<()> {
    let cfg = RunConfig::load(&args.config, mode)
        .with_context(|| format!("failed to load run file {}", args.config.display()))?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    let options = RunOptions {
        out_dir: args.out_dir,
        seed: args.seed,
    };
    let summary = match mode {
        RunMode::Archive => run_archive(&cfg, &options)?,
        RunMode::Series => run_series(&cfg, &options)?,
    };
    info!(
        "run {} finished: {} stars, {} pruned, {} TDEs, energy error {:.3e}",
        summary.tag, summary.stars, summary.pruned, summary.tde_events, summary.energy_error
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args, RunMode::Archive),
        Command::Series(args) => run(args, RunMode::Series),
        Command::Plot {
            base,
            mass,
            ymax,
            tmax,
            col1,
            col2,
            mheavy,
        } => {
            let opts = AnalysisOptions {
                mass,
                tmax,
                ymax,
                mheavy,
                col1,
                col2,
            };
            let summary = analyze(&base, &opts).context("binary count analysis failed")?;
            info!("wrote {} points from {} runs", summary.t_std.len(), summary.runs);
            Ok(())
        }
    }
}
