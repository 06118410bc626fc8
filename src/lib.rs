//! Synthetic telemetry generator for D2D vs. cellular mode selection.
//!
//! Every simulated second, mobile devices move, radio conditions are
//! evaluated, and the throughput-optimal transmission mode is labelled. The
//! resulting [`StepRecord`] stream feeds downstream mode-selection classifiers.
//!
//! - [`simulation`]: the radio-environment engine
//! - [`config`]: run configuration and the `proposed` / `paper` presets
//! - [`dataset`]: episode runner and CSV persistence
//! - [`baselines`]: simple decision rules and their aggregate metrics

pub mod baselines;
pub mod config;
pub mod dataset;
pub mod error;
pub mod simulation;

pub use config::{Profile, SimulationConfig};
pub use error::{Error, Result};
pub use simulation::{Environment, Mode, StepRecord};
