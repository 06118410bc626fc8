//! Reference mode-selection policies and their aggregate metrics.
//!
//! A policy maps a dataset to one [`Mode`] decision per record. [`evaluate`]
//! scores a decision vector by the throughput it would have obtained, how
//! often it flips modes, and how long it stays in D2D.

use std::io;

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::simulation::{Mode, StepRecord};

/// Threshold used by the default SINR policy.
pub const DEFAULT_SINR_THRESHOLD_DB: f64 = 0.0;

/// Seed used by the default random policy.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// A rule that picks a transmission mode for every record of a dataset.
pub trait ModePolicy {
    fn name(&self) -> String;

    /// One decision per record, in record order.
    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode>;
}

pub struct AlwaysD2d;

impl ModePolicy for AlwaysD2d {
    fn name(&self) -> String {
        "Always D2D".to_string()
    }

    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode> {
        vec![Mode::D2d; records.len()]
    }
}

pub struct AlwaysCellular;

impl ModePolicy for AlwaysCellular {
    fn name(&self) -> String {
        "Always Cellular".to_string()
    }

    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode> {
        vec![Mode::Cellular; records.len()]
    }
}

/// Fair coin per record. Reseeded on every `decide` so results are repeatable.
pub struct RandomPolicy {
    pub seed: u64,
}

impl ModePolicy for RandomPolicy {
    fn name(&self) -> String {
        "Random".to_string()
    }

    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        records
            .iter()
            .map(|_| if rng.gen_bool(0.5) { Mode::D2d } else { Mode::Cellular })
            .collect()
    }
}

/// Cellular when the D2D SINR is below `threshold_db`, D2D otherwise.
pub struct SinrThreshold {
    pub threshold_db: f64,
}

impl ModePolicy for SinrThreshold {
    fn name(&self) -> String {
        format!("SINR Threshold ({}dB)", self.threshold_db)
    }

    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode> {
        records
            .iter()
            .map(|r| if r.sinr_d2d_db < self.threshold_db { Mode::Cellular } else { Mode::D2d })
            .collect()
    }
}

/// Replays the throughput-optimal label; the upper bound for any policy.
pub struct GroundTruth;

impl ModePolicy for GroundTruth {
    fn name(&self) -> String {
        "Ground Truth (Max Tput)".to_string()
    }

    fn decide(&mut self, records: &[StepRecord]) -> Vec<Mode> {
        records.iter().map(|r| r.optimal_mode).collect()
    }
}

/// The five reference policies in reporting order.
pub fn default_policies() -> Vec<Box<dyn ModePolicy>> {
    vec![
        Box::new(AlwaysD2d),
        Box::new(AlwaysCellular),
        Box::new(RandomPolicy { seed: DEFAULT_RANDOM_SEED }),
        Box::new(SinrThreshold {
            threshold_db: DEFAULT_SINR_THRESHOLD_DB,
        }),
        Box::new(GroundTruth),
    ]
}

/// Aggregate scores of one policy over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyMetrics {
    #[serde(rename = "Policy")]
    pub policy: String,
    #[serde(rename = "Avg Throughput (Mbps)")]
    pub avg_throughput_mbps: f64,
    #[serde(rename = "Spectral Eff (bps/Hz)")]
    pub spectral_efficiency: f64,
    #[serde(rename = "Switching Rate (per 100s)")]
    pub switching_rate_per_100s: f64,
    #[serde(rename = "Avg D2D Residence (s)")]
    pub avg_d2d_residence_s: f64,
}

impl PolicyMetrics {
    /// Copy with every metric rounded to two decimals, for reporting.
    pub fn rounded(&self) -> Self {
        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            policy: self.policy.clone(),
            avg_throughput_mbps: round2(self.avg_throughput_mbps),
            spectral_efficiency: round2(self.spectral_efficiency),
            switching_rate_per_100s: round2(self.switching_rate_per_100s),
            avg_d2d_residence_s: round2(self.avg_d2d_residence_s),
        }
    }
}

/// Score `decisions` against `records`.
///
/// # Formula
///
/// ```text
/// avg_throughput = mean(throughput of the chosen mode)
/// spectral_eff   = avg_throughput · 1e6 / B
/// switching_rate = switches / (N · dt) · 100
/// residence      = mean(length of contiguous D2D runs) · dt
/// ```
///
/// # Notes
///
/// Consecutive records are compared only within the same episode: a mode
/// change across an episode boundary is not a switch and ends any D2D run.
///
/// # Panics
///
/// If `decisions` and `records` differ in length.
pub fn evaluate(records: &[StepRecord], decisions: &[Mode], policy: &str, time_step_s: f64, bandwidth_hz: f64) -> Result<PolicyMetrics> {
    assert_eq!(records.len(), decisions.len(), "one decision per record");
    if records.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let n = records.len() as f64;

    let total_throughput: f64 = records.iter().zip(decisions).map(|(r, &mode)| r.throughput_for(mode)).sum();
    let avg_throughput_mbps = total_throughput / n;

    let mut switches = 0usize;
    let mut d2d_runs = Vec::new();
    let mut run_length = 0usize;
    for i in 0..records.len() {
        let same_episode = i > 0 && records[i].episode_id == records[i - 1].episode_id;
        if same_episode && decisions[i] != decisions[i - 1] {
            switches += 1;
        }
        if !same_episode && run_length > 0 {
            d2d_runs.push(run_length);
            run_length = 0;
        }
        if decisions[i] == Mode::D2d {
            run_length += 1;
        } else if run_length > 0 {
            d2d_runs.push(run_length);
            run_length = 0;
        }
    }
    if run_length > 0 {
        d2d_runs.push(run_length);
    }

    let avg_d2d_residence_s = if d2d_runs.is_empty() {
        0.0
    } else {
        d2d_runs.iter().sum::<usize>() as f64 / d2d_runs.len() as f64 * time_step_s
    };

    Ok(PolicyMetrics {
        policy: policy.to_string(),
        avg_throughput_mbps,
        spectral_efficiency: avg_throughput_mbps * 1e6 / bandwidth_hz,
        switching_rate_per_100s: switches as f64 / (n * time_step_s) * 100.0,
        avg_d2d_residence_s,
    })
}

/// Run every policy in `policies` over `records`.
pub fn evaluate_policies(records: &[StepRecord], policies: &mut [Box<dyn ModePolicy>], time_step_s: f64, bandwidth_hz: f64) -> Result<Vec<PolicyMetrics>> {
    if records.is_empty() {
        return Err(Error::EmptyDataset);
    }
    policies
        .iter_mut()
        .map(|policy| {
            let name = policy.name();
            info!("Evaluating: {}", name);
            let decisions = policy.decide(records);
            evaluate(records, &decisions, &name, time_step_s, bandwidth_hz)
        })
        .collect()
}

/// Run the [`default_policies`] over `records`.
pub fn evaluate_all(records: &[StepRecord], time_step_s: f64, bandwidth_hz: f64) -> Result<Vec<PolicyMetrics>> {
    evaluate_policies(records, &mut default_policies(), time_step_s, bandwidth_hz)
}

/// Write metrics as CSV, rounded to two decimals.
pub fn write_metrics_csv<W: io::Write>(writer: W, metrics: &[PolicyMetrics]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for m in metrics {
        wtr.serialize(m.rounded())?;
    }
    wtr.flush()?;
    Ok(())
}
