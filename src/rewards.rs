//! System-level reward terms shared by the reward strategies.
//!
//! Both functions aggregate over every vehicle in the network, not just the
//! controlled ones.

use crate::kernel::{is_sentinel_speed, VehicleKernel};

/// Keeps the normalized desired-velocity cost finite when `target` is 0.
const DESIRED_VELOCITY_EPS: f64 = 1e-4;

/// Rewards the network-wide speed profile for being close to `target_velocity`.
///
/// Returns `max(‖t·1‖ − ‖v − t·1‖, 0) / (‖t·1‖ + ε)`, which is 1 when every
/// vehicle drives at the target and 0 when the deviation is as large as the
/// target profile itself.
///
/// Returns 0 if the network is empty, `fail` is set, or any speed reading is
/// a simulator sentinel.
pub fn desired_velocity<V: VehicleKernel + ?Sized>(
    vehicles: &V,
    target_velocity: f64,
    fail: bool,
) -> f64 {
    let speeds: Vec<f64> = vehicles.ids().iter().map(|id| vehicles.speed(id)).collect();

    if fail || speeds.is_empty() || speeds.iter().any(|&v| is_sentinel_speed(v)) {
        return 0.0;
    }

    let max_cost = (speeds.len() as f64).sqrt() * target_velocity;
    let cost = speeds
        .iter()
        .map(|v| (v - target_velocity).powi(2))
        .sum::<f64>()
        .sqrt();

    (max_cost - cost).max(0.0) / (max_cost + DESIRED_VELOCITY_EPS)
}

/// Mean speed of every vehicle in the network.
///
/// Returns 0 when the network is empty, `fail` is set, or any reading is a
/// simulator sentinel.
pub fn average_velocity<V: VehicleKernel + ?Sized>(vehicles: &V, fail: bool) -> f64 {
    let speeds: Vec<f64> = vehicles.ids().iter().map(|id| vehicles.speed(id)).collect();

    if fail || speeds.is_empty() || speeds.iter().any(|&v| is_sentinel_speed(v)) {
        return 0.0;
    }

    speeds.iter().sum::<f64>() / speeds.len() as f64
}
