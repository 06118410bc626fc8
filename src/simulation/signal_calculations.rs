//! Radio channel calculations.
//!
//! Contains helpers for:
//! - Empirical path loss for the cellular (BS → UE) and D2D (UE → UE) regimes
//! - Log-normal shadowing and Rayleigh (exponential power) fading draws
//! - Received power combining all of the above
//! - SINR and Shannon throughput derivation
//!
//! Units:
//! - Power: dBm at the interfaces, Watts for linear sums
//! - Distance: meters (converted to km inside the path-loss equations)
//! - Bandwidth: Hz, throughput: Mbps
//!
//! Everything here is a pure function of its arguments plus the random stream
//! passed in. Disabled channel effects consume no random draw at all, so a
//! reduced-fidelity run keeps a stable stream layout.

use rand::Rng;
use rand_distr::{Exp1, StandardNormal};

use crate::config::{PathLossCoefficients, ShadowingConfig, ShadowingSigma, SimulationConfig};

use super::types::LinkKind;

/// Distance floor of the cellular path-loss model (m).
pub const CELLULAR_MIN_DISTANCE_M: f64 = 1.0;

/// Distance floor of the D2D path-loss model (m).
pub const D2D_MIN_DISTANCE_M: f64 = 0.1;

/// Cellular path loss (dB) at `distance_m`.
///
/// # Formula
///
/// ```text
/// PL_cell(d) = A + B · log10(max(d, 1 m) / 1000)
/// ```
///
/// Distances below 1 m (including zero or negative ones) are floored, so the
/// function never hits the logarithm singularity.
pub fn path_loss_cellular(distance_m: f64, coefficients: &PathLossCoefficients) -> f64 {
    let distance_km = distance_m.max(CELLULAR_MIN_DISTANCE_M) / 1000.0;
    coefficients.cellular_a + coefficients.cellular_b * distance_km.log10()
}

/// D2D path loss (dB) at `distance_m`.
///
/// # Formula
///
/// ```text
/// PL_d2d(d) = A + B · log10(f_MHz) + C · log10(max(d, 0.1 m) / 1000)
/// ```
///
/// Free-space structure with a shorter 0.1 m floor reflecting the short
/// expected D2D ranges.
pub fn path_loss_d2d(distance_m: f64, carrier_freq_mhz: f64, coefficients: &PathLossCoefficients) -> f64 {
    let distance_km = distance_m.max(D2D_MIN_DISTANCE_M) / 1000.0;
    coefficients.d2d_a + coefficients.d2d_b_freq * carrier_freq_mhz.log10() + coefficients.d2d_c_dist * distance_km.log10()
}

/// Path loss for the given link regime.
pub fn path_loss(link: LinkKind, distance_m: f64, config: &SimulationConfig) -> f64 {
    match link {
        LinkKind::Cellular => path_loss_cellular(distance_m, &config.path_loss),
        LinkKind::D2d => path_loss_d2d(distance_m, config.carrier_freq_mhz, &config.path_loss),
    }
}

/// Sample a zero-mean Gaussian shadowing term in dB.
///
/// With a uniform σ model, σ is re-drawn before the Gaussian on every call.
pub fn sample_shadowing_db<R: Rng + ?Sized>(rng: &mut R, sigma: &ShadowingSigma) -> f64 {
    let sigma_db = match *sigma {
        ShadowingSigma::Fixed { sigma_db } => sigma_db,
        ShadowingSigma::Uniform { min_db, max_db } => rng.gen_range(min_db..=max_db),
    };
    let z: f64 = rng.sample(StandardNormal);
    sigma_db * z
}

/// Rayleigh fading power gain |h|², exponentially distributed with mean 1.
pub fn sample_fading_gain<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(Exp1)
}

/// Shadowing contribution in dB, or `None` when shadowing is disabled.
///
/// Disabled shadowing is omitted rather than zeroed: no draw is consumed.
pub fn shadowing_term<R: Rng + ?Sized>(rng: &mut R, shadowing: &ShadowingConfig) -> Option<f64> {
    shadowing.enabled.then(|| sample_shadowing_db(rng, &shadowing.sigma))
}

/// Fading gain, exactly `1.0` with no draw when fading is disabled.
pub fn fading_term<R: Rng + ?Sized>(rng: &mut R, fading_enabled: bool) -> f64 {
    if fading_enabled { sample_fading_gain(rng) } else { 1.0 }
}

/// Compute received power in Watts considering all enabled channel effects.
///
/// # Formula
///
/// ```text
/// P_rx[W] = 10^((P_tx[dBm] − PL[dB] + X_σ[dB] − 30) / 10) × |h|²
/// ```
///
/// # Parameters
///
/// - `tx_power_dbm`: transmit power at the antenna port
/// - `distance_m`: transmitter–receiver separation; degenerate values are floored
/// - `link`: selects the path-loss regime
/// - `config`: coefficients plus shadowing/fading toggles
/// - `rng`: the run's random stream
///
/// # Notes
///
/// Draw order is shadowing (σ then Gaussian) followed by fading, each only
/// when enabled. No upper bound is imposed on the result.
pub fn received_power_watts<R: Rng + ?Sized>(tx_power_dbm: f64, distance_m: f64, link: LinkKind, config: &SimulationConfig, rng: &mut R) -> f64 {
    let path_loss_db = path_loss(link, distance_m, config);
    let shadowing_db = shadowing_term(rng, &config.shadowing).unwrap_or(0.0);
    let rx_power_dbm = tx_power_dbm - path_loss_db + shadowing_db;
    dbm_to_watts(rx_power_dbm) * fading_term(rng, config.fading_enabled)
}

/// Convert power from dBm to Watts: `P(W) = 10^((P(dBm) − 30) / 10)`.
pub fn dbm_to_watts(dbm: f64) -> f64 {
    10f64.powf((dbm - 30.0) / 10.0)
}

/// Convert power from Watts to dBm: `P(dBm) = 10·log10(P(W)·1000)`.
///
/// Zero power maps to `-inf`, which is what an idle interferer pool reports.
pub fn watts_to_dbm(watts: f64) -> f64 {
    10.0 * (watts * 1000.0).log10()
}

/// Ratio in linear scale to decibels.
pub fn linear_to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}

/// Linear SINR `S / (I + N)`.
///
/// # Panics
///
/// If any power is non-finite, `S` or `I` is negative, or `N` is not
/// strictly positive. These only arise from a corrupted channel evaluation.
pub fn sinr_linear(signal_watts: f64, interference_watts: f64, noise_watts: f64) -> f64 {
    assert!(signal_watts.is_finite() && signal_watts >= 0.0, "signal power must be finite and non-negative, got {}", signal_watts);
    assert!(
        interference_watts.is_finite() && interference_watts >= 0.0,
        "interference power must be finite and non-negative, got {}",
        interference_watts
    );
    assert!(noise_watts.is_finite() && noise_watts > 0.0, "noise power must be finite and positive, got {}", noise_watts);
    signal_watts / (interference_watts + noise_watts)
}

/// Shannon capacity in Mbps: `C = B · log2(1 + SINR) / 1e6`.
pub fn shannon_throughput_mbps(bandwidth_hz: f64, sinr_linear: f64) -> f64 {
    bandwidth_hz * (1.0 + sinr_linear).log2() / 1e6
}
