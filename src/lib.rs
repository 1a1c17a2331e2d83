//! highway_marl - multi-agent sensing and reward shaping for highway-with-ramps traffic
//!
//! Autonomous vehicles driving on a highway with on-ramps learn acceleration
//! policies that smooth traffic. This crate holds the contract between the
//! microscopic traffic simulator and the learning agents: partial-observation
//! encoding, reward strategies, action dispatch, and observed-vehicle marking.
//! The simulator itself is consumed through the [`kernel`] traits.

pub mod env;
pub mod kernel;
pub mod metrics;
pub mod policy;
pub mod rewards;
pub mod scenarios;
pub mod spaces;

pub use env::{EnvError, EnvParams, EnvVariant, MultiAgentHighwayEnv, StepResult};
pub use kernel::{Kernel, NetworkKernel, Simulate, VehicleKernel};

use std::collections::BTreeMap;

/// Identifier type used for vehicles, agents, and road edges.
pub type Id = String;

/// Per-agent observation vectors for one step.
pub type Observations = BTreeMap<Id, Vec<f64>>;

/// Per-agent scalar rewards for one step.
pub type Rewards = BTreeMap<Id, f64>;

/// Per-agent action vectors for one step.
pub type Actions = BTreeMap<Id, Vec<f64>>;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
