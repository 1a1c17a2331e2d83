//! Highway with a single on-ramp.
//!
//! ```text
//! inflow_highway -> :left -> left -> :center -> center -> center.46
//!                                       ^
//! inflow_merge -> :bottom -> bottom ----+
//! ```
//!
//! Every edge has one lane. Edge starts are laid out on one absolute axis so
//! that `x_by_id` is meaningful on the upstream highway segments.

use crate::kernel::network::{EdgeInfo, MemoryNetwork};
use crate::kernel::vehicle::{MemoryVehicles, VehicleRecord};
use crate::kernel::{Kernel, KernelError};
use crate::Id;

/// Geometry of the merge network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeNetworkParams {
    /// Length of the on-ramp edge (`bottom`).
    pub merge_length: f64,
    /// Length of the highway leading to the merge (`left`).
    pub pre_merge_length: f64,
    /// Length of the highway past the merge (`center`, `center.46`).
    pub post_merge_length: f64,
    /// Length of the two inflow edges.
    pub inflow_edge_length: f64,
    /// Speed limit applied to every edge, m/s.
    pub speed_limit: f64,
}

impl Default for MergeNetworkParams {
    fn default() -> Self {
        Self {
            merge_length: 100.0,
            pre_merge_length: 200.0,
            post_merge_length: 100.0,
            inflow_edge_length: 100.0,
            speed_limit: 30.0,
        }
    }
}

/// Builds the merge network.
pub fn merge_network(params: &MergeNetworkParams) -> Result<MemoryNetwork, KernelError> {
    let inflow = params.inflow_edge_length;
    let pre = params.pre_merge_length;
    let post = params.post_merge_length;
    let merge = params.merge_length;
    let speed = params.speed_limit;

    let bottom_start = 2.0 * inflow + pre + post + 8.2;

    let mut net = MemoryNetwork::new();
    net.add_edge(EdgeInfo::road("inflow_highway", inflow, speed, 0.0))?;
    net.add_edge(EdgeInfo::junction(":left", 0.1, speed, inflow))?;
    net.add_edge(EdgeInfo::road("left", pre, speed, inflow + 0.1))?;
    net.add_edge(EdgeInfo::junction(":center", 8.0, speed, inflow + pre + 0.1))?;
    net.add_edge(EdgeInfo::road("center", post, speed, inflow + pre + 8.1))?;
    net.add_edge(EdgeInfo::road(
        "center.46",
        post,
        speed,
        bottom_start + merge + 0.1,
    ))?;
    net.add_edge(EdgeInfo::road(
        "inflow_merge",
        inflow,
        speed,
        inflow + pre + post + 8.1,
    ))?;
    net.add_edge(EdgeInfo::junction(
        ":bottom",
        0.1,
        speed,
        2.0 * inflow + pre + post + 8.1,
    ))?;
    net.add_edge(EdgeInfo::road("bottom", merge, speed, bottom_start))?;

    net.connect_lanes("inflow_highway", ":left")?;
    net.connect_lanes(":left", "left")?;
    net.connect_lanes("left", ":center")?;
    net.connect_lanes(":center", "center")?;
    net.connect_lanes("center", "center.46")?;
    net.connect_lanes("inflow_merge", ":bottom")?;
    net.connect_lanes(":bottom", "bottom")?;
    net.connect_lanes("bottom", ":center")?;

    Ok(net)
}

/// Builds an empty kernel over the merge network.
pub fn merge_kernel(
    params: &MergeNetworkParams,
) -> Result<Kernel<MemoryVehicles, MemoryNetwork>, KernelError> {
    Ok(Kernel::new(MemoryVehicles::new(), merge_network(params)?))
}

/// Places `count` vehicles on lane 0 of `edge`, spaced `spacing` meters
/// apart starting at the downstream end, all at `speed`.
///
/// Every `rl_every`-th vehicle (1-based) is autonomous; `0` means none.
pub fn spawn_platoon(
    kernel: &mut Kernel<MemoryVehicles, MemoryNetwork>,
    edge: &str,
    count: usize,
    spacing: f64,
    speed: f64,
    rl_every: usize,
) -> Result<Vec<Id>, KernelError> {
    let length = kernel
        .network
        .edge_info(edge)
        .ok_or_else(|| KernelError::UnknownEdge(edge.to_string()))?
        .length;

    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let position = length - i as f64 * spacing;
        if position < 0.0 {
            break;
        }
        let record = if rl_every > 0 && (i + 1) % rl_every == 0 {
            VehicleRecord::rl(edge, 0, position, speed)
        } else {
            VehicleRecord::human(edge, 0, position, speed)
        };
        ids.push(kernel.add_vehicle(Some(format!("{edge}_{i}")), record)?);
    }
    Ok(ids)
}
