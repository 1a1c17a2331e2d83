//! Fixed-acceleration policy.

use super::trait_::Policy;
use crate::{Actions, Observations};

/// Commands the same acceleration to every agent.
///
/// `ConstantPolicy::new(0.0)` is the cruise baseline: agents hold their
/// current speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantPolicy {
    accel: f64,
}

impl ConstantPolicy {
    pub fn new(accel: f64) -> Self {
        Self { accel }
    }

    pub fn accel(&self) -> f64 {
        self.accel
    }
}

impl Policy for ConstantPolicy {
    fn select_actions(&mut self, observations: &Observations) -> Actions {
        observations
            .keys()
            .map(|id| (id.clone(), vec![self.accel]))
            .collect()
    }

    fn name(&self) -> &str {
        "constant"
    }
}
