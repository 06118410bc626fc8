//! # d2d-mode-sim
//!
//! Command-line front end: generate a mode-selection dataset, or score the
//! baseline policies on an existing one.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, info, warn};

use d2d_mode_sim::baselines::{self, PolicyMetrics};
use d2d_mode_sim::config::ConfigOverrides;
use d2d_mode_sim::dataset::{self, Generator, RunManifest};
use d2d_mode_sim::{Profile, SimulationConfig};

/// D2D vs. cellular mode-selection dataset generator
#[derive(Parser, Debug)]
#[command(name = "d2d-mode-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging for the simulator
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulation and write the dataset as CSV
    Simulate {
        #[command(flatten)]
        run: RunArgs,

        /// Override the number of episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Override the number of steps per episode
        #[arg(long)]
        steps: Option<usize>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Destination CSV file; the manifest is written next to it
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Evaluate the baseline policies on a generated dataset
    Baselines {
        #[command(flatten)]
        run: RunArgs,

        /// Dataset CSV produced by `simulate`
        #[arg(short, long)]
        input: PathBuf,

        /// Optional CSV file for the results table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Configuration selection shared by all subcommands.
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Configuration preset (proposed | paper)
    #[arg(short, long)]
    profile: Option<Profile>,

    /// TOML file with overrides on top of the preset
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl RunArgs {
    fn overrides(&self) -> Result<ConfigOverrides> {
        let mut overrides = match &self.config {
            Some(path) => ConfigOverrides::load(path).with_context(|| format!("loading config {}", path.display()))?,
            None => ConfigOverrides::default(),
        };
        // An explicit --profile wins over the file.
        if self.profile.is_some() {
            overrides.profile = self.profile;
        }
        Ok(overrides)
    }

    fn resolve(&self) -> Result<SimulationConfig> {
        Ok(self.overrides()?.resolve(Profile::Proposed)?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging setup
    let crate_level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("d2d_mode_sim"), crate_level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Simulate {
            run,
            episodes,
            steps,
            seed,
            output,
        } => {
            let mut overrides = run.overrides()?;
            overrides.num_episodes = episodes.or(overrides.num_episodes);
            overrides.steps_per_episode = steps.or(overrides.steps_per_episode);
            overrides.seed = seed.or(overrides.seed);
            let config = overrides.resolve(Profile::Proposed).context("invalid simulation configuration")?;
            simulate(config, &output)
        }
        Command::Baselines { run, input, output } => {
            let config = baseline_config(&run, &input)?;
            evaluate_baselines(&config, &input, output.as_deref())
        }
    }
}

fn simulate(config: SimulationConfig, output: &Path) -> Result<()> {
    info!("Starting up ({} profile)", config.profile);
    let records = Generator::new(config.clone())?.run().context("simulation failed")?;

    dataset::write_csv_file(output, &records).with_context(|| format!("writing dataset {}", output.display()))?;

    let manifest = RunManifest::new(&config, &records);
    let manifest_path = dataset::manifest_path(output);
    manifest
        .write(&manifest_path)
        .with_context(|| format!("writing manifest {}", manifest_path.display()))?;

    info!("Done: {} records, {:.1}% labelled D2D", manifest.record_count, manifest.d2d_share * 100.0);
    Ok(())
}

/// Pick the configuration that scores `input`.
///
/// The manifest written by `simulate` records the exact configuration of the
/// dataset and is used unless `--profile` or `--config` is given. Explicit
/// flags win, but a disagreement on bandwidth or time step is logged.
fn baseline_config(run: &RunArgs, input: &Path) -> Result<SimulationConfig> {
    let manifest_path = dataset::manifest_path(input);
    let manifest = if manifest_path.exists() {
        Some(RunManifest::load(&manifest_path).with_context(|| format!("reading manifest {}", manifest_path.display()))?)
    } else {
        None
    };

    let explicit = run.profile.is_some() || run.config.is_some();
    match manifest {
        Some(manifest) if !explicit => {
            info!("Using configuration from {}", manifest_path.display());
            Ok(manifest.config)
        }
        manifest => {
            let config = run.resolve().context("invalid simulation configuration")?;
            if let Some(manifest) = manifest {
                let recorded = &manifest.config;
                if recorded.bandwidth_hz != config.bandwidth_hz || recorded.time_step_s != config.time_step_s {
                    warn!(
                        "Dataset was generated with B={} Hz, dt={} s but scoring uses B={} Hz, dt={} s",
                        recorded.bandwidth_hz, recorded.time_step_s, config.bandwidth_hz, config.time_step_s
                    );
                }
            } else if !explicit {
                warn!("No manifest next to {}; assuming the {} profile", input.display(), config.profile);
            }
            Ok(config)
        }
    }
}

fn evaluate_baselines(config: &SimulationConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let records = dataset::read_csv_file(input).with_context(|| format!("reading dataset {}", input.display()))?;
    let metrics = baselines::evaluate_all(&records, config.time_step_s, config.bandwidth_hz).context("evaluating baselines")?;

    print_table(&metrics);

    if let Some(path) = output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        baselines::write_metrics_csv(BufWriter::new(file), &metrics)?;
        info!("Results saved to {}", path.display());
    }
    Ok(())
}

fn print_table(metrics: &[PolicyMetrics]) {
    println!(
        "{:<26} {:>12} {:>12} {:>14} {:>14}",
        "Policy", "Tput (Mbps)", "SE (b/s/Hz)", "Switch/100s", "D2D res. (s)"
    );
    for m in metrics.iter().map(PolicyMetrics::rounded) {
        println!(
            "{:<26} {:>12.2} {:>12.2} {:>14.2} {:>14.2}",
            m.policy, m.avg_throughput_mbps, m.spectral_efficiency, m.switching_rate_per_100s, m.avg_d2d_residence_s
        );
    }
}
