//! Simulator-facing service traits.
//!
//! The traffic simulator is an external collaborator. Everything the core
//! needs from it goes through [`VehicleKernel`] (per-vehicle telemetry and
//! commands) and [`NetworkKernel`] (static network metadata). Nothing read
//! from these services is cached across steps.
//!
//! [`MemoryVehicles`] and [`MemoryNetwork`] are a small in-memory backend
//! used by tests and the example program.

pub mod error;
pub mod network;
pub mod simulate;
pub mod vehicle;

pub use error::KernelError;
pub use network::{EdgeInfo, LaneLink, MemoryNetwork};
pub use vehicle::{MemoryVehicles, VehicleRecord};

use crate::Id;

/// Speed reported for a vehicle the simulator cannot resolve.
///
/// Any reading below [`SPEED_SENTINEL_FLOOR`] is treated as this error state.
pub const SPEED_ERROR: f64 = -1001.0;

/// Speeds below this value are simulator error sentinels, not real readings.
pub const SPEED_SENTINEL_FLOOR: f64 = -100.0;

/// Returns true if `speed` is a simulator error sentinel.
pub fn is_sentinel_speed(speed: f64) -> bool {
    speed < SPEED_SENTINEL_FLOOR
}

/// Normalizes a leader/follower reference.
///
/// Simulators report "nobody visible" either as no value or as an empty
/// identifier. Both collapse to `None` here.
pub fn visible(neighbor: Option<Id>) -> Option<Id> {
    neighbor.filter(|id| !id.is_empty())
}

/// Per-vehicle telemetry queries and kinematic commands.
pub trait VehicleKernel {
    /// Identifiers of every vehicle currently in the network.
    fn ids(&self) -> Vec<Id>;

    /// Identifiers of the vehicles under policy control this step.
    fn rl_ids(&self) -> Vec<Id>;

    /// Current speed in m/s, or a sentinel below -100 if unknown.
    fn speed(&self, id: &str) -> f64;

    /// Position along the vehicle's current edge, in meters.
    fn position(&self, id: &str) -> f64;

    fn lane(&self, id: &str) -> usize;

    fn edge(&self, id: &str) -> Id;

    /// Nearest vehicle ahead on the same lane. `None` or an empty id means
    /// nobody is visible; use [`visible`] to normalize.
    fn leader(&self, id: &str) -> Option<Id>;

    /// Nearest vehicle behind on the same lane. Same conventions as
    /// [`leader`](Self::leader).
    fn follower(&self, id: &str) -> Option<Id>;

    /// Bumper-to-bumper gap between the vehicle and its leader, in meters.
    fn headway(&self, id: &str) -> f64;

    /// Absolute longitudinal coordinate of the vehicle in the network.
    fn x_by_id(&self, id: &str) -> f64;

    fn ids_by_edge(&self, edge: &str) -> Vec<Id>;

    /// Commands an acceleration (m/s²) to be applied on the next simulator step.
    fn apply_acceleration(&mut self, id: &str, accel: f64);

    /// Flags a vehicle as observed for rendering purposes.
    fn set_observed(&mut self, id: &str);
}

/// Static network metadata queries.
pub trait NetworkKernel {
    /// Highest speed limit of any edge, in m/s.
    fn max_speed(&self) -> f64;

    /// Total length of the network, in meters.
    fn length(&self) -> f64;

    fn edge_length(&self, edge: &str) -> f64;

    fn speed_limit(&self, edge: &str) -> f64;

    /// `(edge, lane)` pairs that feed directly into `lane` of `edge`.
    fn prev_edge(&self, edge: &str, lane: usize) -> Vec<(Id, usize)>;

    /// Identifiers of internal junction edges.
    fn junction_list(&self) -> Vec<Id>;

    /// Absolute starting coordinate of `edge`, if the edge is known.
    fn edge_start(&self, edge: &str) -> Option<f64>;
}

/// The pair of simulator services consumed by the environment.
#[derive(Debug, Clone)]
pub struct Kernel<V, N> {
    pub vehicle: V,
    pub network: N,
}

impl<V, N> Kernel<V, N> {
    pub fn new(vehicle: V, network: N) -> Self {
        Self { vehicle, network }
    }
}

/// Advances the simulator by one step.
///
/// Implemented by whatever drives the physics. The environment calls it
/// between dispatching actions and reading back telemetry.
pub trait Simulate {
    /// Runs one simulation step. Returns true if a collision or invalid
    /// state occurred during it.
    fn simulation_step(&mut self) -> bool;
}
