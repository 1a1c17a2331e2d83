//! Minimal kinematic stepping for the in-memory kernel.
//!
//! Point-mass integration only: commanded accelerations change speed, speed
//! changes position, and vehicles roll onto the next linked edge or leave the
//! network. Vehicles without a command keep their speed.

use tracing::trace;

use super::error::KernelError;
use super::network::MemoryNetwork;
use super::vehicle::{MemoryVehicles, VehicleRecord};
use super::{Kernel, Simulate, VehicleKernel};
use crate::Id;

impl Kernel<MemoryVehicles, MemoryNetwork> {
    /// Inserts a vehicle after checking its edge and lane against the network.
    ///
    /// # Errors
    ///
    /// - `UnknownEdge` if the record's edge is not in the network
    /// - `InvalidLane` if the lane index is out of range
    /// - `DuplicateVehicle` if the id is taken
    pub fn add_vehicle(
        &mut self,
        id: Option<Id>,
        record: VehicleRecord,
    ) -> Result<Id, KernelError> {
        let info = self
            .network
            .edge_info(&record.edge)
            .ok_or_else(|| KernelError::UnknownEdge(record.edge.clone()))?;
        if record.lane >= info.lanes {
            return Err(KernelError::InvalidLane {
                edge: record.edge.clone(),
                lane: record.lane,
            });
        }
        let start = info.start;
        self.vehicle.insert(id, record.with_edge_start(start))
    }

    /// True if any two vehicles on the same lane overlap.
    pub fn has_collision(&self) -> bool {
        self.vehicle.ids().iter().any(|id| {
            self.vehicle.leader(id).is_some() && self.vehicle.headway(id) < 0.0
        })
    }
}

impl Simulate for Kernel<MemoryVehicles, MemoryNetwork> {
    fn simulation_step(&mut self) -> bool {
        let dt = self.vehicle.sim_step().value();
        let mut exited = Vec::new();

        self.vehicle.clear_observed();
        for (id, v) in self.vehicle.iter_mut() {
            let accel = v.pending_accel.take().unwrap_or(0.0);
            v.speed = (v.speed + accel * dt).max(0.0);
            v.position += v.speed * dt;

            loop {
                let length = match self.network.edge_info(&v.edge) {
                    Some(info) => info.length,
                    None => {
                        exited.push(id.clone());
                        break;
                    }
                };
                if v.position <= length {
                    break;
                }
                match self.network.next_edge(&v.edge, v.lane).into_iter().next() {
                    Some((next, lane)) => {
                        v.position -= length;
                        v.edge_start = self.network.edge_info(&next).map_or(0.0, |e| e.start);
                        v.edge = next;
                        v.lane = lane;
                    }
                    None => {
                        exited.push(id.clone());
                        break;
                    }
                }
            }
        }

        for id in exited {
            if self.vehicle.remove(&id).is_ok() {
                trace!(vehicle = %id, "vehicle left the network");
            }
        }

        self.has_collision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::network::EdgeInfo;
    use qtty::{Quantity, Second};

    fn corridor() -> Kernel<MemoryVehicles, MemoryNetwork> {
        let mut net = MemoryNetwork::new();
        net.add_edge(EdgeInfo::road("a", 10.0, 30.0, 0.0)).unwrap();
        net.add_edge(EdgeInfo::road("b", 10.0, 30.0, 10.0)).unwrap();
        net.connect_lanes("a", "b").unwrap();
        let vehs = MemoryVehicles::new().with_sim_step(Quantity::<Second>::new(1.0));
        Kernel::new(vehs, net)
    }

    #[test]
    fn add_vehicle_validates_edge_and_lane() {
        let mut k = corridor();
        assert!(matches!(
            k.add_vehicle(None, VehicleRecord::human("zzz", 0, 0.0, 0.0)),
            Err(KernelError::UnknownEdge(_))
        ));
        assert!(matches!(
            k.add_vehicle(None, VehicleRecord::human("a", 3, 0.0, 0.0)),
            Err(KernelError::InvalidLane { .. })
        ));
        let id = k
            .add_vehicle(Some("v".into()), VehicleRecord::human("b", 0, 2.0, 0.0))
            .unwrap();
        assert!((k.vehicle.x_by_id(&id) - 12.0).abs() < 1e-10);
    }

    #[test]
    fn acceleration_integrates_once() {
        let mut k = corridor();
        k.add_vehicle(Some("v".into()), VehicleRecord::rl("a", 0, 0.0, 2.0))
            .unwrap();
        k.vehicle.apply_acceleration("v", 1.0);
        assert!(!k.simulation_step());
        assert!((k.vehicle.speed("v") - 3.0).abs() < 1e-10);
        assert!((k.vehicle.position("v") - 3.0).abs() < 1e-10);
        // No new command: speed holds.
        k.simulation_step();
        assert!((k.vehicle.speed("v") - 3.0).abs() < 1e-10);
    }

    #[test]
    fn vehicles_roll_onto_next_edge_and_exit() {
        let mut k = corridor();
        k.add_vehicle(Some("v".into()), VehicleRecord::human("a", 0, 8.0, 5.0))
            .unwrap();
        k.simulation_step();
        assert_eq!(k.vehicle.edge("v"), "b");
        assert!((k.vehicle.position("v") - 3.0).abs() < 1e-10);
        assert!((k.vehicle.x_by_id("v") - 13.0).abs() < 1e-10);
        k.simulation_step();
        k.simulation_step();
        assert!(k.vehicle.is_empty());
    }

    #[test]
    fn overlap_reports_crash() {
        let mut k = corridor();
        k.add_vehicle(Some("front".into()), VehicleRecord::human("a", 0, 6.0, 0.0))
            .unwrap();
        k.add_vehicle(Some("back".into()), VehicleRecord::human("a", 0, 0.0, 3.0))
            .unwrap();
        assert!(k.simulation_step());
    }

    #[test]
    fn speed_never_negative() {
        let mut k = corridor();
        k.add_vehicle(Some("v".into()), VehicleRecord::rl("a", 0, 0.0, 1.0))
            .unwrap();
        k.vehicle.apply_acceleration("v", -5.0);
        k.simulation_step();
        assert_eq!(k.vehicle.speed("v"), 0.0);
    }
}
