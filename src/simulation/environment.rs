//! Episode engine: places the entities of an episode and advances them one
//! time step at a time, emitting a [`StepRecord`] per step.
//!
//! High-level flow of each step:
//! 1) Move the D2D transmitter, the D2D receiver and every interferer.
//! 2) Measure the D2D (Tx↔Rx) and cellular (BS↔Rx) link distances on the
//!    post-movement positions.
//! 3) Evaluate the channel for both links, then aggregate `ρ ×` interference
//!    from every interferer at the receiver.
//! 4) Derive SINR and Shannon throughput for both modes and label the
//!    throughput-optimal one.
//!
//! All randomness comes from one `ChaCha8Rng` owned by the environment, so a
//! run is a pure function of its configuration and seed.

use std::f64::consts::PI;

use log::{debug, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{InterfererCount, SimulationConfig};
use crate::error::{Error, Result};

use super::entities::{BaseStation, UeRole, UserEquipment};
use super::geometry::{Point, clamp_to_disc, is_inside_disc};
use super::mobility::MobilityParams;
use super::signal_calculations::{dbm_to_watts, linear_to_db, received_power_watts, shannon_throughput_mbps, sinr_linear, watts_to_dbm};
use super::types::{EpisodeSummary, LinkKind, Mode, StepRecord};

/// Attempts at drawing a receiver offset that keeps the receiver inside the
/// cell before falling back to pulling it onto the cell edge.
const MAX_PLACEMENT_ATTEMPTS: usize = 64;

/// Derive an independent seed for `episode_id` from a run seed.
///
/// Lets callers that parallelise across episodes give each one its own
/// reproducible stream (SplitMix64 finaliser over the combined value).
pub fn episode_seed(base_seed: u64, episode_id: u64) -> u64 {
    let mut z = base_seed ^ episode_id.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Entities and counters of the episode in progress.
#[derive(Debug, Clone)]
struct Episode {
    id: u64,
    step: u64,
    transmitter: UserEquipment,
    receiver: UserEquipment,
    interferers: Vec<UserEquipment>,
}

/// The radio-environment simulation engine.
pub struct Environment {
    config: SimulationConfig,
    mobility: MobilityParams,
    base_station: BaseStation,
    noise_watts: f64,
    rng: ChaCha8Rng,
    episode: Option<Episode>,
}

impl Environment {
    /// Validate `config` and seed the random stream from `config.seed`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Validate `config` and use a caller-provided random stream.
    pub fn with_rng(config: SimulationConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let noise_watts = dbm_to_watts(config.noise_dbm());
        Ok(Self {
            mobility: MobilityParams::from(&config),
            base_station: BaseStation::new(config.tx_power_bs_dbm),
            noise_watts,
            rng,
            episode: None,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn base_station(&self) -> &BaseStation {
        &self.base_station
    }

    /// Id of the episode in progress, if `reset` has been called.
    pub fn episode_id(&self) -> Option<u64> {
        self.episode.as_ref().map(|e| e.id)
    }

    /// Number of steps taken in the current episode.
    pub fn current_step(&self) -> Option<u64> {
        self.episode.as_ref().map(|e| e.step)
    }

    pub fn transmitter(&self) -> Option<&UserEquipment> {
        self.episode.as_ref().map(|e| &e.transmitter)
    }

    pub fn receiver(&self) -> Option<&UserEquipment> {
        self.episode.as_ref().map(|e| &e.receiver)
    }

    pub fn interferers(&self) -> &[UserEquipment] {
        self.episode.as_ref().map(|e| e.interferers.as_slice()).unwrap_or(&[])
    }

    /// Discard the current entities and place a fresh episode.
    ///
    /// Draw order: transmitter, receiver offset (bearing, distance; only when
    /// the pairing distance is enforced), receiver, interferer count (only
    /// for a uniform pool), interferers.
    pub fn reset(&mut self, episode_id: u64) -> EpisodeSummary {
        let config = &self.config;
        let rng = &mut self.rng;

        let transmitter = UserEquipment::spawn(rng, UeRole::D2dTransmitter, &config.d2d_speed, config);
        let receiver = if config.enforce_d2d_max_distance {
            place_receiver_near(rng, config, transmitter.position())
        } else {
            UserEquipment::spawn(rng, UeRole::D2dReceiver, &config.d2d_speed, config)
        };

        let interferer_count = match config.interferers {
            InterfererCount::Fixed { count } => count,
            InterfererCount::Uniform { min, max } => rng.gen_range(min..=max),
        };
        let interferers = (0..interferer_count)
            .map(|i| UserEquipment::spawn(rng, UeRole::Interferer(i), &config.interferer_speed, config))
            .collect::<Vec<_>>();

        let summary = EpisodeSummary {
            episode_id,
            tx_position: transmitter.position(),
            rx_position: receiver.position(),
            distance_tx_rx: transmitter.distance_to(&receiver),
            tx_speed_mps: transmitter.speed_mps(),
            rx_speed_mps: receiver.speed_mps(),
            interferer_count,
        };
        debug!(
            "Episode {} reset: d(tx,rx)={:.1} m, {} interferers, speeds {:.2}/{:.2} m/s",
            episode_id, summary.distance_tx_rx, interferer_count, summary.tx_speed_mps, summary.rx_speed_mps
        );

        self.episode = Some(Episode {
            id: episode_id,
            step: 0,
            transmitter,
            receiver,
            interferers,
        });
        summary
    }

    /// Advance the current episode by one time step.
    ///
    /// Returns [`Error::NotReset`] if no episode has been placed yet.
    pub fn step(&mut self) -> Result<StepRecord> {
        let Self {
            config,
            mobility,
            base_station,
            noise_watts,
            rng,
            episode,
        } = self;
        let (config, mobility, base_station, noise_watts) = (&*config, &*mobility, &*base_station, *noise_watts);
        let episode = episode.as_mut().ok_or(Error::NotReset)?;
        episode.step += 1;

        // Mobility first: the channel is evaluated on post-movement positions.
        episode.transmitter.advance(rng, mobility);
        episode.receiver.advance(rng, mobility);
        for interferer in episode.interferers.iter_mut() {
            interferer.advance(rng, mobility);
        }

        let tx = &episode.transmitter;
        let rx = &episode.receiver;
        let distance_tx_rx = tx.distance_to(rx);
        let distance_bs_rx = base_station.distance_to(rx);

        let signal_d2d_watts = received_power_watts(tx.tx_power_dbm(), distance_tx_rx, LinkKind::D2d, config, rng);
        let signal_cell_watts = received_power_watts(base_station.tx_power_dbm(), distance_bs_rx, LinkKind::Cellular, config, rng);

        let rho = config.interference_load_factor;
        let interference_watts: f64 = episode
            .interferers
            .iter()
            .map(|interferer| rho * received_power_watts(interferer.tx_power_dbm(), interferer.distance_to(rx), LinkKind::D2d, config, rng))
            .sum();

        let sinr_d2d = sinr_linear(signal_d2d_watts, interference_watts, noise_watts);
        let sinr_cell = sinr_linear(signal_cell_watts, interference_watts, noise_watts);
        let throughput_d2d_mbps = shannon_throughput_mbps(config.bandwidth_hz, sinr_d2d);
        let throughput_cell_mbps = shannon_throughput_mbps(config.bandwidth_hz, sinr_cell);
        let optimal_mode = Mode::optimal(throughput_d2d_mbps, throughput_cell_mbps);

        let tx_position = tx.position();
        let rx_position = rx.position();
        let record = StepRecord {
            episode_id: episode.id,
            timestamp: episode.step,
            optimal_mode,
            tx_pos_x: tx_position.x,
            tx_pos_y: tx_position.y,
            rx_pos_x: rx_position.x,
            rx_pos_y: rx_position.y,
            distance_tx_rx,
            distance_bs_rx,
            tx_speed_mps: tx.speed_mps(),
            rx_speed_mps: rx.speed_mps(),
            tx_power_d2d_dbm: tx.tx_power_dbm(),
            rx_power_d2d_dbm: watts_to_dbm(signal_d2d_watts),
            tx_power_bs_dbm: base_station.tx_power_dbm(),
            rx_power_cell_dbm: watts_to_dbm(signal_cell_watts),
            sinr_d2d_db: linear_to_db(sinr_d2d),
            sinr_cell_db: linear_to_db(sinr_cell),
            interference_dbm: watts_to_dbm(interference_watts),
            noise_dbm: watts_to_dbm(noise_watts),
            throughput_d2d_mbps,
            throughput_cell_mbps,
        };

        trace!(
            "Episode {} step {}: SINR d2d={:.2} dB cell={:.2} dB -> {}",
            record.episode_id, record.timestamp, record.sinr_d2d_db, record.sinr_cell_db, record.optimal_mode
        );
        Ok(record)
    }
}

/// Spawn the D2D receiver within `[d2d_min_dist_m, d2d_max_dist_m)` of the
/// transmitter at a uniform bearing, keeping it inside the cell.
fn place_receiver_near(rng: &mut ChaCha8Rng, config: &SimulationConfig, tx_position: Point) -> UserEquipment {
    let mut candidate = tx_position + random_offset(rng, config);
    let mut receiver = UserEquipment::spawn(rng, UeRole::D2dReceiver, &config.d2d_speed, config);

    let mut attempts = 1;
    while !is_inside_disc(&candidate, config.cell_radius_m) && attempts < MAX_PLACEMENT_ATTEMPTS {
        candidate = tx_position + random_offset(rng, config);
        attempts += 1;
    }
    if !is_inside_disc(&candidate, config.cell_radius_m) {
        warn!(
            "No in-cell offset for {} after {} attempts; pulling it onto the cell edge",
            receiver.role(),
            MAX_PLACEMENT_ATTEMPTS
        );
        candidate = clamp_to_disc(candidate, config.cell_radius_m);
    }

    receiver.place_at(candidate);
    receiver
}

/// Bearing first, then distance.
fn random_offset(rng: &mut ChaCha8Rng, config: &SimulationConfig) -> Point {
    let bearing = rng.gen_range(0.0..2.0 * PI);
    let (min, max) = (config.d2d_min_dist_m, config.d2d_max_dist_m);
    let distance = if min < max { rng.gen_range(min..max) } else { min };
    Point::from_polar(distance, bearing)
}
