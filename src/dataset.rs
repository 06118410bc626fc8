//! Dataset assembly and persistence.
//!
//! - [`Generator`] drives an [`Environment`] through every episode of a run
//! - [`write_csv`] / [`read_csv`] persist records in canonical column order
//! - [`RunManifest`] describes a generated dataset next to its CSV

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{Profile, SimulationConfig};
use crate::error::Result;
use crate::simulation::{Environment, Mode, StepRecord};

/// Suffix appended to the dataset path for its manifest.
const MANIFEST_SUFFIX: &str = ".manifest.json";

/// Runs `num_episodes × steps_per_episode` steps over one environment.
pub struct Generator {
    env: Environment,
}

impl Generator {
    /// Build the environment for `config` (validated, seeded from `config.seed`).
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self::from_environment(Environment::new(config)?))
    }

    pub fn from_environment(env: Environment) -> Self {
        Self { env }
    }

    pub fn config(&self) -> &SimulationConfig {
        self.env.config()
    }

    /// Generate the whole run and collect it in episode-then-step order.
    pub fn run(&mut self) -> Result<Vec<StepRecord>> {
        let capacity = self.config().num_episodes * self.config().steps_per_episode;
        let mut records = Vec::with_capacity(capacity);
        self.run_with(|record| {
            records.push(record.clone());
            Ok(())
        })?;
        Ok(records)
    }

    /// Generate the whole run, handing each record to `sink` as it is produced.
    ///
    /// Stops at the first error returned by the engine or the sink.
    ///
    /// # Returns
    ///
    /// Number of records produced.
    pub fn run_with<F>(&mut self, mut sink: F) -> Result<usize>
    where
        F: FnMut(&StepRecord) -> Result<()>,
    {
        let episodes = self.config().num_episodes as u64;
        let steps = self.config().steps_per_episode;
        info!(
            "Generating {} episodes x {} steps ({} profile, seed {})",
            episodes,
            steps,
            self.config().profile,
            self.config().seed
        );

        let mut produced = 0;
        for episode_id in 0..episodes {
            self.env.reset(episode_id);
            let mut d2d_steps = 0;
            for _ in 0..steps {
                let record = self.env.step()?;
                if record.optimal_mode == Mode::D2d {
                    d2d_steps += 1;
                }
                sink(&record)?;
                produced += 1;
            }
            debug!("Episode {} done: {}/{} steps labelled D2D", episode_id, d2d_steps, steps);
        }

        info!("Generated {} records", produced);
        Ok(produced)
    }
}

/// Write `records` as CSV with a header row in canonical column order.
///
/// The header is written even when `records` is empty.
pub fn write_csv<W: io::Write>(writer: W, records: &[StepRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(StepRecord::COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read records previously written by [`write_csv`].
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<StepRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records = rdr.deserialize().collect::<std::result::Result<Vec<StepRecord>, _>>()?;
    Ok(records)
}

pub fn write_csv_file(path: &Path, records: &[StepRecord]) -> Result<()> {
    write_csv(BufWriter::new(File::create(path)?), records)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn read_csv_file(path: &Path) -> Result<Vec<StepRecord>> {
    let records = read_csv(File::open(path)?)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Path of the manifest belonging to the dataset at `output`.
///
/// `runs/data.csv` maps to `runs/data.csv.manifest.json`.
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(MANIFEST_SUFFIX);
    PathBuf::from(name)
}

/// Provenance of a generated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub generated_at: DateTime<Utc>,
    pub profile: Profile,
    pub record_count: usize,
    /// Fraction of records labelled D2D, in `[0, 1]`.
    pub d2d_share: f64,
    pub config: SimulationConfig,
}

impl RunManifest {
    pub fn new(config: &SimulationConfig, records: &[StepRecord]) -> Self {
        let d2d = records.iter().filter(|r| r.optimal_mode == Mode::D2d).count();
        let d2d_share = if records.is_empty() { 0.0 } else { d2d as f64 / records.len() as f64 };
        Self {
            generated_at: Utc::now(),
            profile: config.profile,
            record_count: records.len(),
            d2d_share,
            config: config.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        debug!("Wrote run manifest to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }
}
