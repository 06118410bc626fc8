//! End-to-end scenarios for the mode-selection simulator.
//!
//! These tests drive the public API the way a dataset pipeline does: build an
//! environment, run episodes, persist the records and score the baselines.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

use d2d_mode_sim::baselines;
use d2d_mode_sim::config::ConfigOverrides;
use d2d_mode_sim::dataset::{self, Generator, RunManifest};
use d2d_mode_sim::{Environment, Mode, Profile, SimulationConfig, StepRecord};

// ============================================================================
// Helpers
// ============================================================================

fn run_episodes(config: SimulationConfig, episodes: u64, steps: usize) -> Vec<StepRecord> {
    let mut env = Environment::new(config).unwrap();
    let mut records = Vec::new();
    for episode in 0..episodes {
        env.reset(episode);
        for _ in 0..steps {
            records.push(env.step().unwrap());
        }
    }
    records
}

fn to_csv_bytes(records: &[StepRecord]) -> Vec<u8> {
    let mut buffer = Vec::new();
    dataset::write_csv(&mut buffer, records).unwrap();
    buffer
}

// ============================================================================
// Engine scenarios
// ============================================================================

#[test]
fn first_step_keeps_pair_within_reach() {
    let mut config = SimulationConfig::proposed();
    config.cell_radius_m = 500.0;
    config.tx_power_d2d_dbm = 23.0;
    config.d2d_max_dist_m = 50.0;
    config.enforce_d2d_max_distance = true;

    let mut env = Environment::new(config.clone()).unwrap();
    for episode in 0..100 {
        env.reset(episode);
        let record = env.step().unwrap();
        let reach = 50.0 + (record.tx_speed_mps + record.rx_speed_mps) * config.time_step_s;
        assert!(record.distance_tx_rx <= reach + 1e-9, "episode {}: {} > {}", episode, record.distance_tx_rx, reach);
        assert!(record.sinr_d2d_db.is_finite());
        assert!(record.sinr_cell_db.is_finite());
    }
}

#[test]
fn same_seed_gives_byte_identical_datasets() {
    let first = to_csv_bytes(&run_episodes(SimulationConfig::proposed(), 2, 100));
    let second = to_csv_bytes(&run_episodes(SimulationConfig::proposed(), 2, 100));
    assert_eq!(first, second);

    let mut other = SimulationConfig::proposed();
    other.seed = 7;
    assert_ne!(first, to_csv_bytes(&run_episodes(other, 2, 100)));
}

#[test]
fn zero_load_factor_removes_all_interference() {
    for profile in [Profile::Proposed, Profile::Paper] {
        let mut config = SimulationConfig::for_profile(profile);
        config.interference_load_factor = 0.0;
        for record in run_episodes(config, 3, 50) {
            assert_eq!(record.interference_dbm, f64::NEG_INFINITY);
        }
    }
}

#[test]
fn paper_profile_runs_with_deterministic_channel() {
    let config = SimulationConfig::paper();
    let noise = config.noise_dbm();
    let records = run_episodes(config, 2, 30);
    assert_eq!(records.len(), 60);
    for r in &records {
        assert!((r.noise_dbm - noise).abs() < 1e-9);
        assert_eq!(r.tx_speed_mps, 3.0);
        assert_eq!(r.rx_speed_mps, 3.0);
        // Thermal noise over 20 MHz.
        assert!((r.noise_dbm - (-174.0 + 10.0 * 20e6_f64.log10())).abs() < 1e-9);
    }
}

#[test]
fn labels_agree_with_throughputs_across_a_run() {
    for r in run_episodes(SimulationConfig::proposed(), 4, 100) {
        assert_eq!(r.optimal_mode, Mode::optimal(r.throughput_d2d_mbps, r.throughput_cell_mbps));
        assert!(r.throughput_d2d_mbps >= 0.0 && r.throughput_cell_mbps >= 0.0);
    }
}

// ============================================================================
// Persistence and baselines
// ============================================================================

#[test]
fn generated_dataset_round_trips_through_files() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("dataset.csv");

    let mut config = SimulationConfig::proposed();
    config.num_episodes = 3;
    config.steps_per_episode = 40;
    let records = Generator::new(config.clone()).unwrap().run().unwrap();
    dataset::write_csv_file(&output, &records).unwrap();
    RunManifest::new(&config, &records).write(&dataset::manifest_path(&output)).unwrap();

    let loaded = dataset::read_csv_file(&output).unwrap();
    assert_eq!(loaded, records);

    let manifest = RunManifest::load(&dataset::manifest_path(&output)).unwrap();
    assert_eq!(manifest.record_count, 120);
    assert!((0.0..=1.0).contains(&manifest.d2d_share));

    let header = fs::read_to_string(&output).unwrap();
    assert_eq!(header.lines().next().unwrap(), StepRecord::COLUMNS.join(","));
}

#[test]
fn ground_truth_dominates_on_generated_data() {
    let config = SimulationConfig::proposed();
    let records = run_episodes(config.clone(), 3, 100);
    let metrics = baselines::evaluate_all(&records, config.time_step_s, config.bandwidth_hz).unwrap();
    let truth = metrics.last().unwrap();
    assert!(truth.policy.starts_with("Ground Truth"));
    for m in &metrics {
        assert!(m.avg_throughput_mbps <= truth.avg_throughput_mbps + 1e-9, "{}", m.policy);
        assert!(m.switching_rate_per_100s >= 0.0 && m.switching_rate_per_100s <= 100.0);
    }
    // Constant policies never switch.
    assert_eq!(metrics[0].switching_rate_per_100s, 0.0);
    assert_eq!(metrics[1].switching_rate_per_100s, 0.0);
    assert_eq!(metrics[1].avg_d2d_residence_s, 0.0);
    // Always-D2D stays in D2D for the whole episode.
    assert!((metrics[0].avg_d2d_residence_s - 100.0).abs() < 1e-9);
}

#[test]
fn toml_overrides_shape_the_run() {
    let overrides = ConfigOverrides::parse(
        r#"
        profile = "paper"
        num_episodes = 2
        steps_per_episode = 5
        interference_load_factor = 0.0
        "#,
    )
    .unwrap();
    let config = overrides.resolve(Profile::Proposed).unwrap();
    assert_eq!(config.profile, Profile::Paper);
    let records = Generator::new(config).unwrap().run().unwrap();
    assert_eq!(records.len(), 10);
    assert!(records.iter().all(|r| r.interference_dbm == f64::NEG_INFINITY));
}

// ============================================================================
// Command line
// ============================================================================

#[test]
fn cli_simulates_and_scores_baselines() {
    let dir = TempDir::new().unwrap();
    let dataset_path = dir.path().join("data.csv");
    let results_path = dir.path().join("baselines.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_d2d-mode-sim"))
        .args(["simulate", "--profile", "paper", "--episodes", "2", "--steps", "10", "--output"])
        .arg(&dataset_path)
        .status()
        .expect("failed to run simulator");
    assert!(status.success());
    assert!(dataset::manifest_path(&dataset_path).exists());
    assert_eq!(dataset::read_csv_file(&dataset_path).unwrap().len(), 20);

    let status = Command::new(env!("CARGO_BIN_EXE_d2d-mode-sim"))
        .args(["baselines", "--profile", "paper", "--input"])
        .arg(&dataset_path)
        .arg("--output")
        .arg(&results_path)
        .status()
        .expect("failed to run baselines");
    assert!(status.success());

    let results = fs::read_to_string(&results_path).unwrap();
    assert_eq!(results.lines().count(), 6);
    assert!(results.starts_with("Policy,"));
}

#[test]
fn cli_baselines_score_with_the_manifest_configuration() {
    let dir = TempDir::new().unwrap();
    let dataset_path = dir.path().join("paper.csv");
    let results_path = dir.path().join("scores.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_d2d-mode-sim"))
        .args(["simulate", "--profile", "paper", "--episodes", "2", "--steps", "10", "--output"])
        .arg(&dataset_path)
        .status()
        .expect("failed to run simulator");
    assert!(status.success());

    // No --profile: bandwidth must come from the manifest (20 MHz), not the
    // proposed default (10 MHz).
    let status = Command::new(env!("CARGO_BIN_EXE_d2d-mode-sim"))
        .args(["baselines", "--input"])
        .arg(&dataset_path)
        .arg("--output")
        .arg(&results_path)
        .status()
        .expect("failed to run baselines");
    assert!(status.success());

    let mut reader = csv::Reader::from_path(&results_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 5);
    for row in &rows {
        let throughput: f64 = row[1].parse().unwrap();
        let spectral_efficiency: f64 = row[2].parse().unwrap();
        // Both columns are rounded to two decimals independently.
        assert!(
            (spectral_efficiency - throughput * 1e6 / 20e6).abs() <= 0.011,
            "{}: SE {} for {} Mbps",
            &row[0],
            spectral_efficiency,
            throughput
        );
    }
}

#[test]
fn cli_rejects_invalid_configuration() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "bandwidth_hz = -1.0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_d2d-mode-sim"))
        .args(["simulate", "--config"])
        .arg(&config_path)
        .arg("--output")
        .arg(dir.path().join("never.csv"))
        .output()
        .expect("failed to run simulator");
    assert!(!output.status.success());
    assert!(!dir.path().join("never.csv").exists());
}
