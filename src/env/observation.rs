//! Per-agent partial-observation encoding.
//!
//! Each agent sees its own speed plus the speed and bumper-to-bumper headway
//! of the vehicles immediately ahead and behind it. The merge-aware encoder
//! adds the agent's distance to the merge point and how far the furthest
//! on-ramp vehicle has progressed.

use tracing::trace;

use crate::kernel::{visible, Kernel, NetworkKernel, VehicleKernel};
use crate::spaces::BoxSpace;
use crate::{Id, Observations};

/// Number of base neighborhood features.
pub const BASE_FEATURE_DIM: usize = 5;

/// Number of features with merge information appended.
pub const MERGE_FEATURE_DIM: usize = 7;

/// Distance-to-merge value used on edges where the feature is not defined.
///
/// The feature is only specified on the upstream highway edges; agents
/// elsewhere (on-ramp, downstream) get this constant. Known limitation.
pub const UNSUPPORTED_EDGE_DISTANCE: f64 = 1.0;

/// Merge-urgency value when the on-ramp is empty.
pub const MERGE_LANE_CLEAR: f64 = 1.0;

/// Edges that define the merge-information features.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeLayout {
    /// The on-ramp edge whose occupancy drives the urgency feature.
    pub merge_edge: Id,
    /// Edge whose start coordinate is the merge point.
    pub reference_edge: Id,
    /// Edges on which the distance feature is defined.
    pub upstream_edges: Vec<Id>,
}

impl Default for MergeLayout {
    fn default() -> Self {
        Self {
            merge_edge: "bottom".into(),
            reference_edge: "center".into(),
            upstream_edges: vec!["inflow_highway".into(), "left".into(), "center".into()],
        }
    }
}

impl MergeLayout {
    /// Relative distance `(x - x_ref) / x_ref` of an agent to the merge point.
    ///
    /// Returns `None` when the feature is unsupported: the agent is not on an
    /// upstream edge, or the reference start is unknown or zero.
    pub fn merge_distance(&self, edge: &str, x: f64, reference_x: Option<f64>) -> Option<f64> {
        if !self.upstream_edges.iter().any(|e| e == edge) {
            return None;
        }
        match reference_x {
            Some(cx) if cx != 0.0 => Some((x - cx) / cx),
            _ => None,
        }
    }

    /// Remaining fraction of the on-ramp ahead of its furthest vehicle.
    ///
    /// [`MERGE_LANE_CLEAR`] if the ramp is empty or has no usable length.
    pub fn merge_urgency<V, N>(&self, kernel: &Kernel<V, N>) -> f64
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        let furthest = kernel
            .vehicle
            .ids_by_edge(&self.merge_edge)
            .iter()
            .map(|id| kernel.vehicle.position(id))
            .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.max(p))));
        let length = kernel.network.edge_length(&self.merge_edge);

        match furthest {
            Some(pos) if length > 0.0 => (length - pos) / length,
            _ => MERGE_LANE_CLEAR,
        }
    }
}

/// Observation encoder selected at environment construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ObservationEncoder {
    /// Five unbounded neighborhood features.
    Base,
    /// Neighborhood features plus two merge features clipped to `[-1, 1]`.
    MergeInfo(MergeLayout),
}

impl ObservationEncoder {
    pub fn dim(&self) -> usize {
        match self {
            Self::Base => BASE_FEATURE_DIM,
            Self::MergeInfo(_) => MERGE_FEATURE_DIM,
        }
    }

    pub fn observation_space(&self) -> BoxSpace {
        match self {
            Self::Base => BoxSpace::unbounded(BASE_FEATURE_DIM),
            Self::MergeInfo(_) => BoxSpace::uniform(MERGE_FEATURE_DIM, -1.0, 1.0),
        }
    }

    pub fn merge_layout(&self) -> Option<&MergeLayout> {
        match self {
            Self::Base => None,
            Self::MergeInfo(layout) => Some(layout),
        }
    }

    /// Encodes one observation per agent currently in the network.
    pub fn encode<V, N>(&self, kernel: &Kernel<V, N>) -> Observations
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        let max_speed = kernel.network.max_speed();
        let max_length = kernel.network.length();

        // Shared by every agent this step.
        let merge = self.merge_layout().map(|layout| {
            let reference_x = kernel.network.edge_start(&layout.reference_edge);
            (layout, reference_x, layout.merge_urgency(kernel))
        });

        kernel
            .vehicle
            .rl_ids()
            .into_iter()
            .map(|id| {
                let mut obs =
                    neighborhood_features(&kernel.vehicle, &id, max_speed, max_length).to_vec();

                if let Some((layout, reference_x, urgency)) = &merge {
                    let edge = kernel.vehicle.edge(&id);
                    let x = kernel.vehicle.x_by_id(&id);
                    let distance = layout
                        .merge_distance(&edge, x, *reference_x)
                        .unwrap_or_else(|| {
                            trace!(agent = %id, edge = %edge, "merge distance unsupported on edge");
                            UNSUPPORTED_EDGE_DISTANCE
                        });
                    obs.push(distance.clamp(-1.0, 1.0));
                    obs.push(urgency.clamp(-1.0, 1.0));
                }

                (id, obs)
            })
            .collect()
    }
}

/// The five neighborhood features of one agent.
///
/// `[v/ms, (v_lead - v)/ms, h_lead/ml, (v - v_follow)/ms, h_follow/ml]`.
/// A missing leader reads as a vehicle at `max_speed` a full network length
/// away; a missing follower as a stopped vehicle a full network length back.
pub fn neighborhood_features<V: VehicleKernel + ?Sized>(
    vehicles: &V,
    id: &str,
    max_speed: f64,
    max_length: f64,
) -> [f64; BASE_FEATURE_DIM] {
    let speed = vehicles.speed(id);

    let (lead_speed, lead_headway) = match visible(vehicles.leader(id)) {
        Some(lead) => (vehicles.speed(&lead), vehicles.headway(id)),
        None => (max_speed, max_length),
    };

    let (follow_speed, follow_headway) = match visible(vehicles.follower(id)) {
        Some(follower) => (vehicles.speed(&follower), vehicles.headway(&follower)),
        None => (0.0, max_length),
    };

    [
        speed / max_speed,
        (lead_speed - speed) / max_speed,
        lead_headway / max_length,
        (speed - follow_speed) / max_speed,
        follow_headway / max_length,
    ]
}
