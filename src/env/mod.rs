//! Environment: observation encoding, reward strategies, action dispatch,
//! and observed-vehicle marking, tied together by [`MultiAgentHighwayEnv`].

pub mod actions;
pub mod config;
pub mod error;
pub mod highway;
pub mod observation;
pub mod reward;
pub mod variant;
pub mod visibility;

pub use config::{EnvParams, HighwayParams, ADDITIONAL_ENV_PARAMS};
pub use error::EnvError;
pub use highway::{MultiAgentHighwayEnv, StepResult};
pub use observation::{MergeLayout, ObservationEncoder};
pub use reward::{CollaborativeWeights, RewardStrategy, SpeedTrackingWeights};
pub use variant::EnvVariant;

#[cfg(test)]
mod tests;
