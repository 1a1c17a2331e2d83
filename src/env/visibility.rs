//! Observed-vehicle marking.

use crate::kernel::{visible, Kernel, NetworkKernel, VehicleKernel};

/// Flags the visible leader and follower of every agent as observed.
///
/// Vehicles seen by several agents are flagged once per observer; the flag
/// is idempotent.
pub fn mark_observed<V, N>(kernel: &mut Kernel<V, N>)
where
    V: VehicleKernel,
    N: NetworkKernel,
{
    for id in kernel.vehicle.rl_ids() {
        let neighbors = [
            visible(kernel.vehicle.leader(&id)),
            visible(kernel.vehicle.follower(&id)),
        ];
        for neighbor in neighbors.into_iter().flatten() {
            kernel.vehicle.set_observed(&neighbor);
        }
    }
}
