//! Type definitions shared by the engine and its consumers.
//!
//! [`StepRecord`] is the sole artifact the engine exposes: its field names,
//! units and (via serde) column order form a compatibility contract with the
//! dataset assembler, the feature pipeline and the baseline policies.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Propagation regime of a radio link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Base station → UE, empirical macro-cell model.
    Cellular,
    /// UE → UE, free-space-derived model. Also used for interferer links.
    D2d,
}

/// Transmission mode label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "D2D")]
    D2d,
    #[serde(rename = "Cellular")]
    Cellular,
}

impl Mode {
    /// Throughput-optimal mode; ties favor D2D.
    pub fn optimal(throughput_d2d_mbps: f64, throughput_cell_mbps: f64) -> Self {
        if throughput_d2d_mbps >= throughput_cell_mbps { Mode::D2d } else { Mode::Cellular }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::D2d => "D2D",
            Mode::Cellular => "Cellular",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one simulated time step.
///
/// Units: meters, m/s, dBm, dB, Mbps. `interference_dbm` is `-inf` when the
/// aggregate interference is exactly zero (load factor 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub episode_id: u64,
    /// 1-based step index within the episode (one step per `time_step_s`).
    pub timestamp: u64,
    pub optimal_mode: Mode,

    pub tx_pos_x: f64,
    pub tx_pos_y: f64,
    pub rx_pos_x: f64,
    pub rx_pos_y: f64,

    pub distance_tx_rx: f64,
    pub distance_bs_rx: f64,

    pub tx_speed_mps: f64,
    pub rx_speed_mps: f64,

    pub tx_power_d2d_dbm: f64,
    pub rx_power_d2d_dbm: f64,
    pub tx_power_bs_dbm: f64,
    pub rx_power_cell_dbm: f64,

    pub sinr_d2d_db: f64,
    pub sinr_cell_db: f64,

    pub interference_dbm: f64,
    pub noise_dbm: f64,

    pub throughput_d2d_mbps: f64,
    pub throughput_cell_mbps: f64,
}

impl StepRecord {
    /// Canonical column order of the persisted dataset.
    pub const COLUMNS: [&'static str; 21] = [
        "episode_id",
        "timestamp",
        "optimal_mode",
        "tx_pos_x",
        "tx_pos_y",
        "rx_pos_x",
        "rx_pos_y",
        "distance_tx_rx",
        "distance_bs_rx",
        "tx_speed_mps",
        "rx_speed_mps",
        "tx_power_d2d_dbm",
        "rx_power_d2d_dbm",
        "tx_power_bs_dbm",
        "rx_power_cell_dbm",
        "sinr_d2d_db",
        "sinr_cell_db",
        "interference_dbm",
        "noise_dbm",
        "throughput_d2d_mbps",
        "throughput_cell_mbps",
    ];

    pub fn tx_position(&self) -> Point {
        Point::new(self.tx_pos_x, self.tx_pos_y)
    }

    pub fn rx_position(&self) -> Point {
        Point::new(self.rx_pos_x, self.rx_pos_y)
    }

    /// Throughput achieved when transmitting in `mode`.
    pub fn throughput_for(&self, mode: Mode) -> f64 {
        match mode {
            Mode::D2d => self.throughput_d2d_mbps,
            Mode::Cellular => self.throughput_cell_mbps,
        }
    }
}

/// State reported by `Environment::reset` for a freshly placed episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode_id: u64,
    pub tx_position: Point,
    pub rx_position: Point,
    pub distance_tx_rx: f64,
    pub tx_speed_mps: f64,
    pub rx_speed_mps: f64,
    pub interferer_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimal_mode_ties_favor_d2d() {
        assert_eq!(Mode::optimal(10.0, 10.0), Mode::D2d);
        assert_eq!(Mode::optimal(10.0 + f64::EPSILON * 16.0, 10.0), Mode::D2d);
        assert_eq!(Mode::optimal(9.999, 10.0), Mode::Cellular);
        assert_eq!(Mode::optimal(0.0, 0.0), Mode::D2d);
    }

    #[test]
    fn mode_labels_are_stable() {
        assert_eq!(Mode::D2d.to_string(), "D2D");
        assert_eq!(Mode::Cellular.to_string(), "Cellular");
        assert_eq!(serde_json::to_string(&Mode::D2d).unwrap(), "\"D2D\"");
        assert_eq!(serde_json::from_str::<Mode>("\"Cellular\"").unwrap(), Mode::Cellular);
    }
}
