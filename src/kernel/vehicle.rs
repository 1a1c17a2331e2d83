//! In-memory vehicle telemetry store.

use std::collections::BTreeMap;

use qtty::{Quantity, Second};
use tracing::debug;

use super::error::KernelError;
use super::network::LENGTH_ERROR;
use super::{VehicleKernel, SPEED_ERROR};
use crate::Id;

/// Lane reported for a vehicle the store does not know.
pub const LANE_ERROR: usize = usize::MAX;

/// Headway reported when no leader is visible.
pub const NO_LEADER_HEADWAY: f64 = 1000.0;

/// Default vehicle length in meters.
pub const VEHICLE_LENGTH: f64 = 5.0;

/// State of a single simulated vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub edge: Id,
    pub lane: usize,
    /// Position of the front bumper along `edge`, in meters.
    pub position: f64,
    /// Speed in m/s.
    pub speed: f64,
    pub length: f64,
    /// Vehicle is controlled by the learning agent.
    pub rl: bool,
    /// Absolute coordinate where `edge` begins.
    pub edge_start: f64,
    pub(crate) observed: bool,
    pub(crate) pending_accel: Option<f64>,
    pub(crate) last_accel: Option<f64>,
}

impl VehicleRecord {
    /// A human-driven vehicle.
    pub fn human(edge: impl Into<Id>, lane: usize, position: f64, speed: f64) -> Self {
        Self {
            edge: edge.into(),
            lane,
            position,
            speed,
            length: VEHICLE_LENGTH,
            rl: false,
            edge_start: 0.0,
            observed: false,
            pending_accel: None,
            last_accel: None,
        }
    }

    /// An autonomous vehicle under policy control.
    pub fn rl(edge: impl Into<Id>, lane: usize, position: f64, speed: f64) -> Self {
        Self {
            rl: true,
            ..Self::human(edge, lane, position, speed)
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_edge_start(mut self, edge_start: f64) -> Self {
        self.edge_start = edge_start;
        self
    }

    fn key(&self, id: &str) -> (f64, String) {
        (self.position, id.to_string())
    }
}

/// Vehicles keyed by id, ordered for deterministic iteration.
///
/// Leaders and followers are resolved from positions on the same edge and
/// lane; vehicles on neighboring edges are not visible to each other.
#[derive(Debug, Clone)]
pub struct MemoryVehicles {
    vehicles: BTreeMap<Id, VehicleRecord>,
    sim_step: Quantity<Second>,
}

impl Default for MemoryVehicles {
    fn default() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            sim_step: Quantity::<Second>::new(0.5),
        }
    }
}

impl MemoryVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sim_step(mut self, sim_step: Quantity<Second>) -> Self {
        self.sim_step = sim_step;
        self
    }

    /// Duration of one simulation step.
    pub fn sim_step(&self) -> Quantity<Second> {
        self.sim_step
    }

    /// Inserts a vehicle with the given id, or a generated one if `None`.
    /// Returns the id that was used.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateVehicle` if the id is already in use.
    pub fn insert(&mut self, id: Option<Id>, record: VehicleRecord) -> Result<Id, KernelError> {
        let id = id.unwrap_or_else(crate::generate_id);
        if self.vehicles.contains_key(&id) {
            return Err(KernelError::DuplicateVehicle(id));
        }
        self.vehicles.insert(id.clone(), record);
        Ok(id)
    }

    /// Removes a vehicle from the network.
    pub fn remove(&mut self, id: &str) -> Result<VehicleRecord, KernelError> {
        self.vehicles
            .remove(id)
            .ok_or_else(|| KernelError::UnknownVehicle(id.to_string()))
    }

    pub fn record(&self, id: &str) -> Option<&VehicleRecord> {
        self.vehicles.get(id)
    }

    pub fn record_mut(&mut self, id: &str) -> Option<&mut VehicleRecord> {
        self.vehicles.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn is_observed(&self, id: &str) -> bool {
        self.vehicles.get(id).is_some_and(|v| v.observed)
    }

    pub fn observed_ids(&self) -> Vec<Id> {
        self.vehicles
            .iter()
            .filter(|(_, v)| v.observed)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Last acceleration commanded for a vehicle, if any.
    pub fn applied_acceleration(&self, id: &str) -> Option<f64> {
        self.vehicles.get(id).and_then(|v| v.last_accel)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&Id, &mut VehicleRecord)> {
        self.vehicles.iter_mut()
    }

    pub(crate) fn clear_observed(&mut self) {
        for v in self.vehicles.values_mut() {
            v.observed = false;
        }
    }

    fn same_lane<'a>(
        &'a self,
        rec: &'a VehicleRecord,
    ) -> impl Iterator<Item = (&'a Id, &'a VehicleRecord)> + 'a {
        self.vehicles
            .iter()
            .filter(move |(_, v)| v.edge == rec.edge && v.lane == rec.lane)
    }

    fn leader_of(&self, id: &str) -> Option<(&Id, &VehicleRecord)> {
        let rec = self.vehicles.get(id)?;
        let own = rec.key(id);
        self.same_lane(rec)
            .filter(|(other, v)| v.key(other) > own)
            .min_by(|(a, va), (b, vb)| {
                va.key(a)
                    .partial_cmp(&vb.key(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn follower_of(&self, id: &str) -> Option<(&Id, &VehicleRecord)> {
        let rec = self.vehicles.get(id)?;
        let own = rec.key(id);
        self.same_lane(rec)
            .filter(|(other, v)| v.key(other) < own)
            .max_by(|(a, va), (b, vb)| {
                va.key(a)
                    .partial_cmp(&vb.key(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

impl VehicleKernel for MemoryVehicles {
    fn ids(&self) -> Vec<Id> {
        self.vehicles.keys().cloned().collect()
    }

    fn rl_ids(&self) -> Vec<Id> {
        self.vehicles
            .iter()
            .filter(|(_, v)| v.rl)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn speed(&self, id: &str) -> f64 {
        self.vehicles.get(id).map_or(SPEED_ERROR, |v| v.speed)
    }

    fn position(&self, id: &str) -> f64 {
        self.vehicles.get(id).map_or(LENGTH_ERROR, |v| v.position)
    }

    fn lane(&self, id: &str) -> usize {
        self.vehicles.get(id).map_or(LANE_ERROR, |v| v.lane)
    }

    fn edge(&self, id: &str) -> Id {
        self.vehicles
            .get(id)
            .map(|v| v.edge.clone())
            .unwrap_or_default()
    }

    fn leader(&self, id: &str) -> Option<Id> {
        self.leader_of(id).map(|(lid, _)| lid.clone())
    }

    fn follower(&self, id: &str) -> Option<Id> {
        self.follower_of(id).map(|(fid, _)| fid.clone())
    }

    fn headway(&self, id: &str) -> f64 {
        let Some(rec) = self.vehicles.get(id) else {
            return LENGTH_ERROR;
        };
        match self.leader_of(id) {
            Some((_, lead)) => lead.position - lead.length - rec.position,
            None => NO_LEADER_HEADWAY,
        }
    }

    fn x_by_id(&self, id: &str) -> f64 {
        self.vehicles
            .get(id)
            .map_or(LENGTH_ERROR, |v| v.edge_start + v.position)
    }

    fn ids_by_edge(&self, edge: &str) -> Vec<Id> {
        self.vehicles
            .iter()
            .filter(|(_, v)| v.edge == edge)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn apply_acceleration(&mut self, id: &str, accel: f64) {
        match self.vehicles.get_mut(id) {
            Some(v) => {
                v.pending_accel = Some(accel);
                v.last_accel = Some(accel);
            }
            None => debug!(vehicle = id, "acceleration for unknown vehicle ignored"),
        }
    }

    fn set_observed(&mut self, id: &str) {
        if let Some(v) = self.vehicles.get_mut(id) {
            v.observed = true;
        }
    }
}
