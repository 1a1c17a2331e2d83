//! Forwarding of agent commands to the simulator.

use tracing::{debug, warn};

use super::config::HighwayParams;
use crate::kernel::{Kernel, NetworkKernel, VehicleKernel};
use crate::spaces::BoxSpace;
use crate::Actions;

/// One-dimensional acceleration box `[-|max_decel|, max_accel]`.
pub fn action_space(params: &HighwayParams) -> BoxSpace {
    BoxSpace::new(vec![-params.max_decel.abs()], vec![params.max_accel])
}

/// Sends each agent's commanded acceleration to the vehicle kernel.
///
/// Only the first element of an action vector is used. A trailing
/// lane-change element is accepted and ignored. Values are forwarded as
/// given; keeping them inside [`action_space`] is the policy's job.
pub fn apply_rl_actions<V, N>(kernel: &mut Kernel<V, N>, actions: Option<&Actions>)
where
    V: VehicleKernel,
    N: NetworkKernel,
{
    let Some(actions) = actions else {
        debug!("no actions supplied, nothing dispatched");
        return;
    };

    for (id, action) in actions {
        match action.first() {
            Some(&accel) => kernel.vehicle.apply_acceleration(id, accel),
            None => warn!(agent = %id, "empty action vector skipped"),
        }
    }
}
