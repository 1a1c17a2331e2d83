//! Reward strategies.
//!
//! All strategies share the observation contract and differ only in how the
//! per-agent scalar is computed. The strategy is picked once, when the
//! environment is built.

use std::collections::HashSet;

use qtty::{Quantity, Second};
use tracing::warn;

use crate::kernel::{is_sentinel_speed, visible, Kernel, NetworkKernel, VehicleKernel};
use crate::rewards::{average_velocity, desired_velocity};
use crate::{Id, Rewards};

/// Constant reward of the negative baseline.
pub const NEGATIVE_REWARD: f64 = -0.1;

/// Weights of the global speed-tracking reward.
///
/// `reward = max(eta1 * desired_velocity + eta2 * headway_penalty, 0)`.
/// The headway term is computed but disabled by `eta2 = 0` by default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedTrackingWeights {
    pub eta1: f64,
    pub eta2: f64,
    /// Time headways below this are penalized.
    #[cfg_attr(feature = "serde", serde(with = "seconds"))]
    pub min_time_headway: Quantity<Second>,
}

impl Default for SpeedTrackingWeights {
    fn default() -> Self {
        Self {
            eta1: 1.0,
            eta2: 0.0,
            min_time_headway: Quantity::<Second>::new(1.0),
        }
    }
}

/// Weights of the shared-credit reward.
///
/// `reward = fixed_penalty * penalty_weight
///         + average_velocity / velocity_scale * velocity_weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollaborativeWeights {
    pub fixed_penalty: f64,
    pub penalty_weight: f64,
    pub velocity_weight: f64,
    pub velocity_scale: f64,
}

impl Default for CollaborativeWeights {
    fn default() -> Self {
        Self {
            fixed_penalty: -1.0,
            penalty_weight: 0.5,
            velocity_weight: 0.5,
            velocity_scale: 30.0,
        }
    }
}

/// Step-level inputs every strategy may consult.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardContext {
    /// A collision or invalid simulator state occurred this step.
    pub fail: bool,
    pub evaluate: bool,
    pub target_velocity: f64,
}

/// The family of reward strategies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RewardStrategy {
    /// System-level desired-velocity tracking with an optional short
    /// time-headway penalty. Raw agent speed in evaluation mode, 0 on failure.
    SpeedTracking(SpeedTrackingWeights),
    /// Mean speed of the other same-lane vehicles at or behind the agent, including
    /// upstream edges reached through junctions, over the edge speed limit.
    LocalAverage,
    /// [`NEGATIVE_REWARD`] for every agent. Ignores the failure flag.
    Negative,
    /// One blended value broadcast to every agent. Ignores the failure flag.
    Collaborative(CollaborativeWeights),
}

impl RewardStrategy {
    pub fn speed_tracking() -> Self {
        Self::SpeedTracking(SpeedTrackingWeights::default())
    }

    pub fn collaborative() -> Self {
        Self::Collaborative(CollaborativeWeights::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeedTracking(_) => "speed_tracking",
            Self::LocalAverage => "local_average",
            Self::Negative => "negative",
            Self::Collaborative(_) => "collaborative",
        }
    }

    /// Computes one reward per agent currently in the network.
    pub fn compute<V, N>(&self, kernel: &Kernel<V, N>, ctx: &RewardContext) -> Rewards
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        let agents = kernel.vehicle.rl_ids();

        match self {
            Self::SpeedTracking(weights) => {
                let cost1 = if ctx.evaluate || ctx.fail {
                    0.0
                } else {
                    desired_velocity(&kernel.vehicle, ctx.target_velocity, ctx.fail)
                };
                agents
                    .into_iter()
                    .map(|id| {
                        let r = if ctx.evaluate {
                            kernel.vehicle.speed(&id)
                        } else if ctx.fail {
                            0.0
                        } else {
                            let cost2 = headway_penalty(
                                &kernel.vehicle,
                                &id,
                                weights.min_time_headway,
                            );
                            (weights.eta1 * cost1 + weights.eta2 * cost2).max(0.0)
                        };
                        (id, r)
                    })
                    .collect()
            }
            Self::LocalAverage => {
                let junctions: HashSet<Id> = kernel.network.junction_list().into_iter().collect();
                agents
                    .into_iter()
                    .map(|id| {
                        let r = local_average_speed(kernel, &id, &junctions, ctx.fail);
                        (id, r)
                    })
                    .collect()
            }
            Self::Negative => agents.into_iter().map(|id| (id, NEGATIVE_REWARD)).collect(),
            Self::Collaborative(w) => {
                let r = w.fixed_penalty * w.penalty_weight
                    + average_velocity(&kernel.vehicle, false) / w.velocity_scale
                        * w.velocity_weight;
                agents.into_iter().map(|id| (id, r)).collect()
            }
        }
    }
}

/// Time gap to the leader, `max(headway / speed, 0)`.
///
/// `None` when no leader is visible or the agent is not moving.
pub fn time_headway<V: VehicleKernel + ?Sized>(vehicles: &V, id: &str) -> Option<Quantity<Second>> {
    let speed = vehicles.speed(id);
    if speed <= 0.0 || visible(vehicles.leader(id)).is_none() {
        return None;
    }
    Some(Quantity::<Second>::new((vehicles.headway(id) / speed).max(0.0)))
}

/// `min((t_h - t_min) / t_min, 0)`; zero at or above the threshold, when
/// there is no time headway to speak of, and for a non-positive threshold.
pub fn headway_penalty<V: VehicleKernel + ?Sized>(
    vehicles: &V,
    id: &str,
    min_time_headway: Quantity<Second>,
) -> f64 {
    let t_min = min_time_headway.value();
    if t_min <= 0.0 {
        return 0.0;
    }
    match time_headway(vehicles, id) {
        Some(t) => ((t.value() - t_min) / t_min).min(0.0),
        None => 0.0,
    }
}

/// Vehicles on `lane` of `edge`.
fn vehicles_on_lane<V: VehicleKernel + ?Sized>(vehicles: &V, edge: &str, lane: usize) -> Vec<Id> {
    vehicles
        .ids_by_edge(edge)
        .into_iter()
        .filter(|v| vehicles.lane(v) == lane)
        .collect()
}

/// Same-lane vehicles on every edge upstream of `(edge, lane)`.
///
/// Each direct predecessor contributes its vehicles; predecessors that are
/// junctions are expanded further. Every `(edge, lane)` is visited at most
/// once, so a cyclic topology terminates and shared ancestors count once.
pub fn upstream_vehicles<V, N>(
    kernel: &Kernel<V, N>,
    edge: &str,
    lane: usize,
    junctions: &HashSet<Id>,
) -> Vec<Id>
where
    V: VehicleKernel,
    N: NetworkKernel,
{
    let mut found = Vec::new();
    let mut visited: HashSet<(Id, usize)> = HashSet::new();
    visited.insert((edge.to_string(), lane));
    let mut worklist = vec![(edge.to_string(), lane)];

    while let Some((e, l)) = worklist.pop() {
        for (prev, prev_lane) in kernel.network.prev_edge(&e, l) {
            if !visited.insert((prev.clone(), prev_lane)) {
                continue;
            }
            found.extend(vehicles_on_lane(&kernel.vehicle, &prev, prev_lane));
            if junctions.contains(&prev) {
                worklist.push((prev, prev_lane));
            }
        }
    }

    found
}

/// Local neighborhood reward of one agent.
///
/// Neighbors are the other same-lane vehicles at or behind the agent plus the
/// upstream vehicles; the agent itself never counts. 0 on failure, with no
/// neighbors, with a sentinel speed among them, or when the agent's edge has
/// no positive speed limit.
pub fn local_average_speed<V, N>(
    kernel: &Kernel<V, N>,
    id: &str,
    junctions: &HashSet<Id>,
    fail: bool,
) -> f64
where
    V: VehicleKernel,
    N: NetworkKernel,
{
    if fail {
        return 0.0;
    }

    let vehicles = &kernel.vehicle;
    let edge = vehicles.edge(id);
    let lane = vehicles.lane(id);
    let position = vehicles.position(id);

    let mut neighbors: Vec<Id> = vehicles_on_lane(vehicles, &edge, lane)
        .into_iter()
        .filter(|v| v != id && vehicles.position(v) <= position)
        .collect();
    neighbors.extend(upstream_vehicles(kernel, &edge, lane, junctions));

    if neighbors.is_empty() {
        return 0.0;
    }

    let speeds: Vec<f64> = neighbors.iter().map(|v| vehicles.speed(v)).collect();
    if speeds.iter().any(|&s| is_sentinel_speed(s)) {
        warn!(agent = id, "sentinel speed among neighbors, local reward zeroed");
        return 0.0;
    }

    let limit = kernel.network.speed_limit(&edge);
    if limit <= 0.0 {
        return 0.0;
    }

    speeds.iter().sum::<f64>() / speeds.len() as f64 / limit
}

#[cfg(feature = "serde")]
mod seconds {
    use qtty::{Quantity, Second};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(q: &Quantity<Second>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(q.value())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Quantity<Second>, D::Error> {
        f64::deserialize(d).map(Quantity::<Second>::new)
    }
}
