use thiserror::Error;

/// Errors raised while building or mutating the in-memory kernel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    #[error("Edge already exists: {0}")]
    DuplicateEdge(String),

    #[error("Vehicle ID already exists: {0}")]
    DuplicateVehicle(String),

    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    #[error("Edge {edge} has no lane {lane}")]
    InvalidLane { edge: String, lane: usize },
}
