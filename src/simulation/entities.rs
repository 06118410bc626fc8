//! Radio entities of one cell: a fixed base station and mobile UEs.

use std::fmt;

use rand::Rng;

use crate::config::{SimulationConfig, SpeedProfile};

use super::geometry::{Point, random_point_in_disc};
use super::mobility::{Mobility, MobilityParams, MobilityState, Transition};

/// The cellular base station, fixed at the cell centre.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStation {
    tx_power_dbm: f64,
}

impl BaseStation {
    pub fn new(tx_power_dbm: f64) -> Self {
        Self { tx_power_dbm }
    }

    pub fn position(&self) -> Point {
        Point::ORIGIN
    }

    pub fn tx_power_dbm(&self) -> f64 {
        self.tx_power_dbm
    }

    pub fn distance_to(&self, ue: &UserEquipment) -> f64 {
        self.position().distance_to(&ue.position())
    }
}

/// Role a UE plays in an episode; doubles as its identity tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UeRole {
    D2dTransmitter,
    D2dReceiver,
    Interferer(usize),
}

impl fmt::Display for UeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UeRole::D2dTransmitter => write!(f, "Target_Tx"),
            UeRole::D2dReceiver => write!(f, "Target_Rx"),
            UeRole::Interferer(index) => write!(f, "Int_{}", index),
        }
    }
}

/// Draw a scalar speed for the profile. `Constant` consumes no draw.
pub fn sample_speed<R: Rng + ?Sized>(rng: &mut R, profile: &SpeedProfile) -> f64 {
    if let SpeedProfile::Constant { mps } = *profile {
        return mps;
    }
    let (min, max) = profile.range();
    if min < max { rng.gen_range(min..max) } else { min }
}

/// A mobile user equipment with fixed speed and transmit power.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEquipment {
    role: UeRole,
    mobility: Mobility,
    tx_power_dbm: f64,
}

impl UserEquipment {
    /// Create a UE at a uniform random point of the cell, heading for a
    /// uniform random waypoint.
    ///
    /// Draw order: position (2), waypoint (2), speed (0 or 1).
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, role: UeRole, speed: &SpeedProfile, config: &SimulationConfig) -> Self {
        let position = random_point_in_disc(rng, config.cell_radius_m);
        let destination = random_point_in_disc(rng, config.cell_radius_m);
        let speed_mps = sample_speed(rng, speed);
        Self {
            role,
            mobility: Mobility::new(position, MobilityState::Moving { destination }, speed_mps),
            tx_power_dbm: config.tx_power_d2d_dbm,
        }
    }

    pub fn role(&self) -> UeRole {
        self.role
    }

    pub fn position(&self) -> Point {
        self.mobility.position()
    }

    pub fn speed_mps(&self) -> f64 {
        self.mobility.speed_mps()
    }

    pub fn tx_power_dbm(&self) -> f64 {
        self.tx_power_dbm
    }

    pub fn is_paused(&self) -> bool {
        self.mobility.is_paused()
    }

    pub fn distance_to(&self, other: &UserEquipment) -> f64 {
        self.position().distance_to(&other.position())
    }

    pub(crate) fn place_at(&mut self, position: Point) {
        self.mobility.place_at(position);
    }

    /// Advance this UE by one time step of the mobility model.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, params: &MobilityParams) -> Transition {
        self.mobility.advance(rng, params)
    }
}
