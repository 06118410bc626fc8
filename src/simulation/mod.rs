//! Radio-environment simulation core.
//!
//! This module provides the complete engine for one target D2D pair plus a
//! pool of interferers inside a single cell. It integrates:
//! - Planar geometry and uniform placement inside the cell
//! - Random-waypoint-with-pause mobility
//! - The stochastic channel model (path loss, shadowing, fading)
//! - Interference aggregation, SINR/throughput derivation and mode labelling
//!
//! ## Module Organization
//!
//! - `geometry`: Points, distances, disc sampling
//! - `signal_calculations`: Path loss, channel draws, received power, SINR, Shannon
//! - `mobility`: Paused/Moving state machine of one UE
//! - `entities`: Base station and user equipment
//! - `types`: Step records, mode labels, episode summaries
//! - `environment`: Episode engine driving `reset()` / `step()`
//!
//! ## Public API
//!
//! The main entry point is [`Environment`]: call `reset(episode_id)` to place
//! an episode, then `step()` once per simulated time step.

pub mod entities;
pub mod environment;
pub mod geometry;
pub mod mobility;
pub mod signal_calculations;
pub mod types;

// Re-export the engine for convenience
pub use environment::{Environment, episode_seed};

// Re-export commonly used types
pub use geometry::Point;
pub use types::{EpisodeSummary, LinkKind, Mode, StepRecord};
