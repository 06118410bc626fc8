//! Simulation configuration: canonical profiles, TOML overrides and validation.
//!
//! A run is described by one immutable [`SimulationConfig`]. Two canonical
//! presets exist:
//! - [`Profile::Proposed`]: full-fidelity channel (shadowing + Rayleigh fading),
//!   stop-and-go mobility and a variable interferer pool.
//! - [`Profile::Paper`]: reduced-fidelity replication of the reference paper
//!   (deterministic channel, near-continuous motion, fixed interferer pool).
//!
//! Both presets drive the exact same engine; only these values differ.
//!
//! Units: frequencies in MHz, bandwidth in Hz, distances in meters, powers in
//! dBm, speeds in m/s, time in seconds.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical configuration preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Proposed,
    Paper,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Proposed => write!(f, "proposed"),
            Profile::Paper => write!(f, "paper"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "proposed" => Ok(Profile::Proposed),
            "paper" | "paper-replication" => Ok(Profile::Paper),
            other => Err(format!("unknown profile '{}', expected 'proposed' or 'paper'", other)),
        }
    }
}

/// Coefficients of the two empirical path-loss equations.
///
/// ```text
/// PL_cell(d) = cellular_a + cellular_b · log10(d_km)
/// PL_d2d(d)  = d2d_a + d2d_b_freq · log10(f_MHz) + d2d_c_dist · log10(d_km)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLossCoefficients {
    pub cellular_a: f64,
    pub cellular_b: f64,
    pub d2d_a: f64,
    pub d2d_b_freq: f64,
    pub d2d_c_dist: f64,
}

impl Default for PathLossCoefficients {
    fn default() -> Self {
        Self {
            cellular_a: 128.1,
            cellular_b: 37.6,
            d2d_a: 32.45,
            d2d_b_freq: 20.0,
            d2d_c_dist: 20.0,
        }
    }
}

/// Standard deviation of log-normal shadowing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ShadowingSigma {
    /// Same σ for every draw.
    Fixed { sigma_db: f64 },
    /// σ re-sampled uniformly from `[min_db, max_db]` on every draw.
    Uniform { min_db: f64, max_db: f64 },
}

/// Shadowing toggle plus its σ model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowingConfig {
    pub enabled: bool,
    pub sigma: ShadowingSigma,
}

/// Receiver noise power model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseModel {
    /// Fixed noise power in dBm, independent of bandwidth.
    Fixed { dbm: f64 },
    /// Thermal noise: `density_dbm_per_hz + 10·log10(bandwidth_hz)`.
    Thermal { density_dbm_per_hz: f64 },
}

impl NoiseModel {
    /// Noise power in dBm for the given system bandwidth.
    pub fn noise_dbm(&self, bandwidth_hz: f64) -> f64 {
        match *self {
            NoiseModel::Fixed { dbm } => dbm,
            NoiseModel::Thermal { density_dbm_per_hz } => density_dbm_per_hz + 10.0 * bandwidth_hz.log10(),
        }
    }
}

/// Size of the interferer pool drawn at each episode reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InterfererCount {
    Fixed { count: usize },
    /// Inclusive on both ends.
    Uniform { min: usize, max: usize },
}

/// Speed class of a UE; the scalar speed is drawn once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum SpeedProfile {
    /// 1–3 m/s.
    Pedestrian,
    /// 3–10 m/s.
    Vehicle,
    /// Uniform in `[min_mps, max_mps]`.
    Mixed { min_mps: f64, max_mps: f64 },
    /// Every UE moves at exactly this speed; consumes no random draw.
    Constant { mps: f64 },
}

impl SpeedProfile {
    pub const PEDESTRIAN_RANGE: (f64, f64) = (1.0, 3.0);
    pub const VEHICLE_RANGE: (f64, f64) = (3.0, 10.0);

    /// The `[min, max]` speed interval covered by this profile.
    pub fn range(&self) -> (f64, f64) {
        match *self {
            SpeedProfile::Pedestrian => Self::PEDESTRIAN_RANGE,
            SpeedProfile::Vehicle => Self::VEHICLE_RANGE,
            SpeedProfile::Mixed { min_mps, max_mps } => (min_mps, max_mps),
            SpeedProfile::Constant { mps } => (mps, mps),
        }
    }
}

/// Immutable per-run configuration of the radio-environment engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub profile: Profile,

    // General network settings
    pub carrier_freq_mhz: f64,
    pub bandwidth_hz: f64,
    pub cell_radius_m: f64,
    pub noise: NoiseModel,

    // Transmit powers
    pub tx_power_bs_dbm: f64,
    pub tx_power_d2d_dbm: f64,

    // Channel model
    pub path_loss: PathLossCoefficients,
    pub shadowing: ShadowingConfig,
    pub fading_enabled: bool,
    /// ρ ∈ [0, 1]: fraction of nominal interference power actually experienced.
    pub interference_load_factor: f64,

    // D2D pairing
    pub d2d_min_dist_m: f64,
    pub d2d_max_dist_m: f64,
    pub enforce_d2d_max_distance: bool,

    // Population and mobility
    pub interferers: InterfererCount,
    pub d2d_speed: SpeedProfile,
    pub interferer_speed: SpeedProfile,
    pub probability_start_moving: f64,
    pub time_step_s: f64,

    // Run shape
    pub num_episodes: usize,
    pub steps_per_episode: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::proposed()
    }
}

impl SimulationConfig {
    /// Full-fidelity configuration used to generate training data.
    pub fn proposed() -> Self {
        Self {
            profile: Profile::Proposed,
            carrier_freq_mhz: 700.0,
            bandwidth_hz: 10e6,
            cell_radius_m: 500.0,
            noise: NoiseModel::Fixed { dbm: -114.0 },
            tx_power_bs_dbm: 46.0,
            tx_power_d2d_dbm: 23.0,
            path_loss: PathLossCoefficients::default(),
            shadowing: ShadowingConfig {
                enabled: true,
                sigma: ShadowingSigma::Fixed { sigma_db: 6.0 },
            },
            fading_enabled: true,
            interference_load_factor: 1.0,
            d2d_min_dist_m: 10.0,
            d2d_max_dist_m: 50.0,
            enforce_d2d_max_distance: true,
            interferers: InterfererCount::Uniform { min: 10, max: 20 },
            d2d_speed: SpeedProfile::Mixed { min_mps: 1.0, max_mps: 10.0 },
            interferer_speed: SpeedProfile::Vehicle,
            probability_start_moving: 0.3,
            time_step_s: 1.0,
            num_episodes: 50,
            steps_per_episode: 100,
            seed: 42,
        }
    }

    /// Reduced-fidelity configuration replicating the reference paper.
    pub fn paper() -> Self {
        Self {
            profile: Profile::Paper,
            carrier_freq_mhz: 700.0,
            bandwidth_hz: 20e6,
            cell_radius_m: 500.0,
            noise: NoiseModel::Thermal { density_dbm_per_hz: -174.0 },
            tx_power_bs_dbm: 46.0,
            tx_power_d2d_dbm: 23.0,
            path_loss: PathLossCoefficients::default(),
            shadowing: ShadowingConfig {
                enabled: false,
                sigma: ShadowingSigma::Fixed { sigma_db: 6.0 },
            },
            fading_enabled: false,
            interference_load_factor: 0.1,
            d2d_min_dist_m: 10.0,
            d2d_max_dist_m: 500.0,
            enforce_d2d_max_distance: false,
            interferers: InterfererCount::Fixed { count: 20 },
            d2d_speed: SpeedProfile::Constant { mps: 3.0 },
            interferer_speed: SpeedProfile::Constant { mps: 3.0 },
            probability_start_moving: 1.0,
            time_step_s: 1.0,
            num_episodes: 100,
            steps_per_episode: 300,
            seed: 42,
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Proposed => Self::proposed(),
            Profile::Paper => Self::paper(),
        }
    }

    /// Load a TOML override file and resolve it against its profile preset.
    pub fn load(path: &Path) -> Result<Self> {
        ConfigOverrides::load(path)?.resolve(Profile::Proposed)
    }

    /// Noise power in dBm for this configuration.
    pub fn noise_dbm(&self) -> f64 {
        self.noise.noise_dbm(self.bandwidth_hz)
    }

    /// Check every invariant the engine relies on.
    ///
    /// Fails fast with [`Error::InvalidConfig`]; values are never clamped.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_config(format!("{} must be a positive finite number, got {}", name, value)));
            }
            Ok(())
        }
        fn finite(name: &str, value: f64) -> Result<()> {
            if !value.is_finite() {
                return Err(Error::invalid_config(format!("{} must be finite, got {}", name, value)));
            }
            Ok(())
        }
        fn unit_interval(name: &str, value: f64) -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::invalid_config(format!("{} must be within [0, 1], got {}", name, value)));
            }
            Ok(())
        }

        positive("carrier_freq_mhz", self.carrier_freq_mhz)?;
        positive("bandwidth_hz", self.bandwidth_hz)?;
        positive("cell_radius_m", self.cell_radius_m)?;
        positive("time_step_s", self.time_step_s)?;
        finite("tx_power_bs_dbm", self.tx_power_bs_dbm)?;
        finite("tx_power_d2d_dbm", self.tx_power_d2d_dbm)?;
        finite("noise_dbm", self.noise_dbm())?;

        let pl = &self.path_loss;
        for (name, value) in [
            ("path_loss.cellular_a", pl.cellular_a),
            ("path_loss.cellular_b", pl.cellular_b),
            ("path_loss.d2d_a", pl.d2d_a),
            ("path_loss.d2d_b_freq", pl.d2d_b_freq),
            ("path_loss.d2d_c_dist", pl.d2d_c_dist),
        ] {
            finite(name, value)?;
        }

        match self.shadowing.sigma {
            ShadowingSigma::Fixed { sigma_db } => {
                if !sigma_db.is_finite() || sigma_db < 0.0 {
                    return Err(Error::invalid_config(format!("shadowing sigma must be non-negative, got {}", sigma_db)));
                }
            }
            ShadowingSigma::Uniform { min_db, max_db } => {
                if !min_db.is_finite() || !max_db.is_finite() || min_db < 0.0 || min_db > max_db {
                    return Err(Error::invalid_config(format!(
                        "shadowing sigma range [{}, {}] must be non-negative and ordered",
                        min_db, max_db
                    )));
                }
            }
        }

        unit_interval("interference_load_factor", self.interference_load_factor)?;
        unit_interval("probability_start_moving", self.probability_start_moving)?;

        if let InterfererCount::Uniform { min, max } = self.interferers {
            if min > max {
                return Err(Error::invalid_config(format!("interferer range [{}, {}] is inverted", min, max)));
            }
        }

        for (name, speed) in [("d2d_speed", self.d2d_speed), ("interferer_speed", self.interferer_speed)] {
            let (lo, hi) = speed.range();
            if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || lo > hi {
                return Err(Error::invalid_config(format!(
                    "{} range [{}, {}] must be positive and ordered",
                    name, lo, hi
                )));
            }
        }

        if self.enforce_d2d_max_distance {
            positive("d2d_min_dist_m", self.d2d_min_dist_m)?;
            positive("d2d_max_dist_m", self.d2d_max_dist_m)?;
            if self.d2d_min_dist_m > self.d2d_max_dist_m {
                return Err(Error::invalid_config(format!(
                    "d2d_min_dist_m {} exceeds d2d_max_dist_m {}",
                    self.d2d_min_dist_m, self.d2d_max_dist_m
                )));
            }
            if self.d2d_max_dist_m >= 2.0 * self.cell_radius_m {
                return Err(Error::invalid_config(format!(
                    "d2d_max_dist_m {} cannot be enforced inside a cell of diameter {}",
                    self.d2d_max_dist_m,
                    2.0 * self.cell_radius_m
                )));
            }
        }

        if self.num_episodes == 0 {
            return Err(Error::invalid_config("num_episodes must be at least 1"));
        }
        if self.steps_per_episode == 0 {
            return Err(Error::invalid_config("steps_per_episode must be at least 1"));
        }

        if !self.shadowing.enabled && self.fading_enabled {
            log::warn!("Fading enabled without shadowing; channel fidelity is mixed");
        }

        Ok(())
    }
}

/// Partial configuration read from a TOML file.
///
/// Every field is optional and overrides the matching field of the preset
/// named by `profile` (or the caller's default profile).
///
/// ```toml
/// profile = "paper"
/// interference_load_factor = 0.5
/// steps_per_episode = 120
///
/// [shadowing]
/// enabled = true
/// sigma = { mode = "uniform", min_db = 4.0, max_db = 8.0 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub profile: Option<Profile>,
    pub carrier_freq_mhz: Option<f64>,
    pub bandwidth_hz: Option<f64>,
    pub cell_radius_m: Option<f64>,
    pub noise: Option<NoiseModel>,
    pub tx_power_bs_dbm: Option<f64>,
    pub tx_power_d2d_dbm: Option<f64>,
    pub path_loss: Option<PathLossCoefficients>,
    pub shadowing: Option<ShadowingConfig>,
    pub fading_enabled: Option<bool>,
    pub interference_load_factor: Option<f64>,
    pub d2d_min_dist_m: Option<f64>,
    pub d2d_max_dist_m: Option<f64>,
    pub enforce_d2d_max_distance: Option<bool>,
    pub interferers: Option<InterfererCount>,
    pub d2d_speed: Option<SpeedProfile>,
    pub interferer_speed: Option<SpeedProfile>,
    pub probability_start_moving: Option<f64>,
    pub time_step_s: Option<f64>,
    pub num_episodes: Option<usize>,
    pub steps_per_episode: Option<usize>,
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    /// Read overrides from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply onto the preset for `self.profile` (falling back to
    /// `default_profile`) and validate the result.
    pub fn resolve(&self, default_profile: Profile) -> Result<SimulationConfig> {
        let mut config = SimulationConfig::for_profile(self.profile.unwrap_or(default_profile));
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite every field of `config` that is set here.
    pub fn apply(&self, config: &mut SimulationConfig) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field { config.$field = value; })*
            };
        }
        set!(
            carrier_freq_mhz,
            bandwidth_hz,
            cell_radius_m,
            noise,
            tx_power_bs_dbm,
            tx_power_d2d_dbm,
            path_loss,
            shadowing,
            fading_enabled,
            interference_load_factor,
            d2d_min_dist_m,
            d2d_max_dist_m,
            enforce_d2d_max_distance,
            interferers,
            d2d_speed,
            interferer_speed,
            probability_start_moving,
            time_step_s,
            num_episodes,
            steps_per_episode,
            seed,
        );
    }
}
