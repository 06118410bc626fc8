//! Random-waypoint mobility with pauses.
//!
//! Each UE is either [`MobilityState::Paused`] or [`MobilityState::Moving`]
//! towards a destination waypoint inside the cell:
//!
//! ```text
//!            u < p_start                 step >= remaining
//!   Paused ───────────────▶ Moving ────────────────────────▶ Paused
//!     ▲  │ (new waypoint)     │  ▲                           (snap onto
//!     └──┘ u >= p_start       └──┘ step < remaining           waypoint)
//! ```
//!
//! The disc is convex and both endpoints of every leg lie inside it, so a UE
//! never leaves the cell.

use rand::Rng;

use crate::config::SimulationConfig;

use super::geometry::{Point, random_point_in_disc};

/// Movement state of one UE. Exactly one of the two holds at any time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MobilityState {
    Paused,
    Moving { destination: Point },
}

/// What happened to a UE during one call to [`Mobility::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remained paused; position unchanged.
    StayedPaused,
    /// Left the pause and travelled part of the way to a new waypoint.
    Departed,
    /// Still en route after this step.
    Travelled,
    /// Reached (snapped onto) the waypoint and paused.
    Arrived,
}

/// Parameters of the mobility model shared by all UEs of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MobilityParams {
    pub cell_radius_m: f64,
    pub time_step_s: f64,
    pub probability_start_moving: f64,
}

impl From<&SimulationConfig> for MobilityParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            cell_radius_m: config.cell_radius_m,
            time_step_s: config.time_step_s,
            probability_start_moving: config.probability_start_moving,
        }
    }
}

/// Position and waypoint state of one mobile entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Mobility {
    position: Point,
    state: MobilityState,
    speed_mps: f64,
}

impl Mobility {
    pub fn new(position: Point, state: MobilityState, speed_mps: f64) -> Self {
        Self { position, state, speed_mps }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn state(&self) -> MobilityState {
        self.state
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, MobilityState::Paused)
    }

    /// Relocate the entity without touching its waypoint or speed.
    ///
    /// Used during episode placement only.
    pub(crate) fn place_at(&mut self, position: Point) {
        self.position = position;
    }

    /// Advance by one time step.
    ///
    /// A paused entity draws one uniform number; if it falls below
    /// `probability_start_moving` a new waypoint is drawn (two more draws)
    /// and the entity moves in the same step. A moving entity consumes no
    /// draws.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, params: &MobilityParams) -> Transition {
        let (destination, departed) = match self.state {
            MobilityState::Paused => {
                if rng.r#gen::<f64>() >= params.probability_start_moving {
                    return Transition::StayedPaused;
                }
                let destination = random_point_in_disc(rng, params.cell_radius_m);
                self.state = MobilityState::Moving { destination };
                (destination, true)
            }
            MobilityState::Moving { destination } => (destination, false),
        };

        let offset = destination - self.position;
        let remaining = offset.norm();
        let step_distance = self.speed_mps * params.time_step_s;

        if remaining == 0.0 || step_distance >= remaining {
            // Snap onto the waypoint to avoid overshoot.
            self.position = destination;
            self.state = MobilityState::Paused;
            Transition::Arrived
        } else {
            self.position = self.position + offset * (step_distance / remaining);
            if departed { Transition::Departed } else { Transition::Travelled }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometry::is_inside_disc;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn params(p: f64) -> MobilityParams {
        MobilityParams {
            cell_radius_m: 500.0,
            time_step_s: 1.0,
            probability_start_moving: p,
        }
    }

    #[test]
    fn paused_entity_never_moves_with_zero_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let start = Point::new(12.0, -40.0);
        let mut ue = Mobility::new(start, MobilityState::Paused, 5.0);
        for _ in 0..1_000 {
            assert_eq!(ue.advance(&mut rng, &params(0.0)), Transition::StayedPaused);
            assert_eq!(ue.position(), start);
            assert!(ue.is_paused());
        }
    }

    #[test]
    fn moving_entity_approaches_destination_monotonically() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let destination = Point::new(100.0, 0.0);
        let mut ue = Mobility::new(Point::ORIGIN, MobilityState::Moving { destination }, 7.0);
        let mut previous = ue.position().distance_to(&destination);
        let mut steps = 0;
        loop {
            let transition = ue.advance(&mut rng, &params(1.0));
            steps += 1;
            let remaining = ue.position().distance_to(&destination);
            if transition == Transition::Arrived {
                assert_eq!(ue.position(), destination);
                assert!(ue.is_paused());
                break;
            }
            assert_eq!(transition, Transition::Travelled);
            assert!(remaining < previous);
            assert!((previous - remaining - 7.0).abs() < 1e-9);
            previous = remaining;
        }
        // 100 m at 7 m/s: 14 full steps then the snap.
        assert_eq!(steps, 15);
    }

    #[test]
    fn moving_entity_consumes_no_draws() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut untouched = rng.clone();
        let mut ue = Mobility::new(Point::ORIGIN, MobilityState::Moving { destination: Point::new(0.0, 300.0) }, 2.0);
        ue.advance(&mut rng, &params(0.5));
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn zero_remaining_distance_pauses_without_nan() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let here = Point::new(3.0, 4.0);
        let mut ue = Mobility::new(here, MobilityState::Moving { destination: here }, 5.0);
        assert_eq!(ue.advance(&mut rng, &params(0.0)), Transition::Arrived);
        assert_eq!(ue.position(), here);
        assert!(!ue.position().x.is_nan());
        assert!(ue.is_paused());
    }

    #[test]
    fn certain_departure_leaves_pause_every_time() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ue = Mobility::new(Point::ORIGIN, MobilityState::Paused, 3.0);
        let transition = ue.advance(&mut rng, &params(1.0));
        assert!(matches!(transition, Transition::Departed | Transition::Arrived));
        assert_ne!(ue.position(), Point::ORIGIN);
    }

    #[test]
    fn long_walks_stay_inside_cell_and_keep_speed() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut ue = Mobility::new(Point::new(499.0, 0.0), MobilityState::Paused, 9.5);
        for _ in 0..5_000 {
            ue.advance(&mut rng, &params(0.4));
            assert!(is_inside_disc(&ue.position(), 500.0 + 1e-9));
            assert_eq!(ue.speed_mps(), 9.5);
        }
    }
}
