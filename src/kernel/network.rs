//! In-memory road network backed by a directed lane-link graph.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use super::error::KernelError;
use super::{NetworkKernel, SPEED_ERROR};
use crate::Id;

/// Length reported for an edge the network does not know.
pub const LENGTH_ERROR: f64 = -1001.0;

/// A road edge (graph node).
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub name: Id,
    /// Edge length in meters.
    pub length: f64,
    /// Posted speed limit in m/s.
    pub speed_limit: f64,
    pub lanes: usize,
    /// Absolute longitudinal coordinate where the edge begins.
    pub start: f64,
    /// Internal junction edge (connects two road edges).
    pub junction: bool,
}

impl EdgeInfo {
    /// A single-lane road edge.
    pub fn road(name: impl Into<Id>, length: f64, speed_limit: f64, start: f64) -> Self {
        Self {
            name: name.into(),
            length,
            speed_limit,
            lanes: 1,
            start,
            junction: false,
        }
    }

    /// A single-lane internal junction edge.
    pub fn junction(name: impl Into<Id>, length: f64, speed_limit: f64, start: f64) -> Self {
        Self {
            junction: true,
            ..Self::road(name, length, speed_limit, start)
        }
    }

    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes;
        self
    }
}

/// Connection from a lane of one edge to a lane of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneLink {
    pub from_lane: usize,
    pub to_lane: usize,
}

/// Road network whose nodes are edges and whose graph edges are lane links.
///
/// # Invariants
///
/// - Edge names are unique
/// - Every [`LaneLink`] references lanes that exist on both endpoints
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    graph: StableGraph<EdgeInfo, LaneLink, Directed>,
    node_by_name: HashMap<Id, NodeIndex>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a road or junction edge.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEdge` if an edge with the same name exists.
    pub fn add_edge(&mut self, info: EdgeInfo) -> Result<NodeIndex, KernelError> {
        if self.node_by_name.contains_key(&info.name) {
            return Err(KernelError::DuplicateEdge(info.name));
        }
        let name = info.name.clone();
        let node = self.graph.add_node(info);
        self.node_by_name.insert(name, node);
        Ok(node)
    }

    /// Links `from_lane` of edge `from` to `to_lane` of edge `to`.
    ///
    /// # Errors
    ///
    /// - `UnknownEdge` if either edge does not exist
    /// - `InvalidLane` if either lane index is out of range
    pub fn connect(
        &mut self,
        from: &str,
        from_lane: usize,
        to: &str,
        to_lane: usize,
    ) -> Result<(), KernelError> {
        let src = self.node(from)?;
        let dst = self.node(to)?;
        self.check_lane(src, from_lane)?;
        self.check_lane(dst, to_lane)?;
        self.graph.add_edge(src, dst, LaneLink { from_lane, to_lane });
        Ok(())
    }

    /// Links every lane of `from` to the same lane of `to`.
    pub fn connect_lanes(&mut self, from: &str, to: &str) -> Result<(), KernelError> {
        let lanes = self
            .edge_info(from)
            .ok_or_else(|| KernelError::UnknownEdge(from.to_string()))?
            .lanes;
        for lane in 0..lanes {
            self.connect(from, lane, to, lane)?;
        }
        Ok(())
    }

    pub fn edge_info(&self, name: &str) -> Option<&EdgeInfo> {
        self.node_by_name
            .get(name)
            .and_then(|&n| self.graph.node_weight(n))
    }

    pub fn contains_edge(&self, name: &str) -> bool {
        self.node_by_name.contains_key(name)
    }

    /// `(edge, lane)` pairs reachable directly from `lane` of `edge`.
    pub fn next_edge(&self, edge: &str, lane: usize) -> Vec<(Id, usize)> {
        self.linked(edge, lane, Direction::Outgoing)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edges(&self) -> impl Iterator<Item = &EdgeInfo> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |n| self.graph.node_weight(n))
    }

    fn node(&self, name: &str) -> Result<NodeIndex, KernelError> {
        self.node_by_name
            .get(name)
            .copied()
            .ok_or_else(|| KernelError::UnknownEdge(name.to_string()))
    }

    fn check_lane(&self, node: NodeIndex, lane: usize) -> Result<(), KernelError> {
        match self.graph.node_weight(node) {
            Some(info) if lane < info.lanes => Ok(()),
            Some(info) => Err(KernelError::InvalidLane {
                edge: info.name.clone(),
                lane,
            }),
            None => Err(KernelError::UnknownEdge(format!("{node:?}"))),
        }
    }

    fn linked(&self, edge: &str, lane: usize, direction: Direction) -> Vec<(Id, usize)> {
        let Some(&node) = self.node_by_name.get(edge) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, direction)
            .filter_map(|link| {
                let w = link.weight();
                let (own_lane, other, other_lane) = match direction {
                    Direction::Incoming => (w.to_lane, link.source(), w.from_lane),
                    Direction::Outgoing => (w.from_lane, link.target(), w.to_lane),
                };
                if own_lane != lane {
                    return None;
                }
                self.graph
                    .node_weight(other)
                    .map(|info| (info.name.clone(), other_lane))
            })
            .collect()
    }
}

impl NetworkKernel for MemoryNetwork {
    fn max_speed(&self) -> f64 {
        self.edges()
            .map(|e| e.speed_limit)
            .fold(0.0, f64::max)
    }

    /// Sums the lengths of road edges; junction edges are excluded.
    fn length(&self) -> f64 {
        self.edges()
            .filter(|e| !e.junction)
            .map(|e| e.length)
            .sum()
    }

    fn edge_length(&self, edge: &str) -> f64 {
        self.edge_info(edge).map_or(LENGTH_ERROR, |e| e.length)
    }

    fn speed_limit(&self, edge: &str) -> f64 {
        self.edge_info(edge).map_or(SPEED_ERROR, |e| e.speed_limit)
    }

    fn prev_edge(&self, edge: &str, lane: usize) -> Vec<(Id, usize)> {
        self.linked(edge, lane, Direction::Incoming)
    }

    fn junction_list(&self) -> Vec<Id> {
        self.edges()
            .filter(|e| e.junction)
            .map(|e| e.name.clone())
            .collect()
    }

    fn edge_start(&self, edge: &str) -> Option<f64> {
        self.edge_info(edge).map(|e| e.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_edge_network() -> MemoryNetwork {
        let mut net = MemoryNetwork::new();
        net.add_edge(EdgeInfo::road("a", 100.0, 20.0, 0.0)).unwrap();
        net.add_edge(EdgeInfo::junction(":a", 5.0, 20.0, 100.0))
            .unwrap();
        net.add_edge(EdgeInfo::road("b", 50.0, 30.0, 105.0).with_lanes(2))
            .unwrap();
        net.connect_lanes("a", ":a").unwrap();
        net.connect(":a", 0, "b", 1).unwrap();
        net
    }

    #[test]
    fn duplicate_edge_rejected() {
        let mut net = two_edge_network();
        let err = net
            .add_edge(EdgeInfo::road("a", 1.0, 1.0, 0.0))
            .unwrap_err();
        assert_eq!(err, KernelError::DuplicateEdge("a".into()));
    }

    #[test]
    fn connect_checks_lanes() {
        let mut net = two_edge_network();
        let err = net.connect("a", 1, "b", 0).unwrap_err();
        assert_eq!(
            err,
            KernelError::InvalidLane {
                edge: "a".into(),
                lane: 1
            }
        );
        assert!(matches!(
            net.connect("a", 0, "zzz", 0),
            Err(KernelError::UnknownEdge(_))
        ));
    }

    #[test]
    fn prev_edge_follows_lane_links() {
        let net = two_edge_network();
        assert_eq!(net.prev_edge("b", 1), vec![(":a".to_string(), 0)]);
        assert!(net.prev_edge("b", 0).is_empty());
        assert_eq!(net.prev_edge(":a", 0), vec![("a".to_string(), 0)]);
        assert!(net.prev_edge("a", 0).is_empty());
        assert!(net.prev_edge("unknown", 0).is_empty());
    }

    #[test]
    fn next_edge_follows_lane_links() {
        let net = two_edge_network();
        assert_eq!(net.next_edge(":a", 0), vec![("b".to_string(), 1)]);
        assert!(net.next_edge("b", 1).is_empty());
    }

    #[test]
    fn metadata_queries() {
        let net = two_edge_network();
        assert_eq!(net.max_speed(), 30.0);
        assert_eq!(net.length(), 150.0);
        assert_eq!(net.edge_length("b"), 50.0);
        assert_eq!(net.edge_length("missing"), LENGTH_ERROR);
        assert_eq!(net.speed_limit("a"), 20.0);
        assert_eq!(net.junction_list(), vec![":a".to_string()]);
        assert_eq!(net.edge_start("b"), Some(105.0));
        assert_eq!(net.edge_start("missing"), None);
        assert!(net.contains_edge(":a"));
        assert!(!net.contains_edge("missing"));
    }
}
