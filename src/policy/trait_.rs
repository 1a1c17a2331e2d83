//! Policy trait for the highway environment.

use crate::{Actions, Observations};

/// A policy that maps per-agent observations to per-agent actions.
///
/// Actions are acceleration vectors; only the first element is used by the
/// environment.
pub trait Policy: Send + Sync {
    /// Selects one action per observed agent.
    ///
    /// # Arguments
    ///
    /// * `observations` - Per-agent observation vectors keyed by agent id
    ///
    /// # Returns
    ///
    /// An action for every agent in `observations`.
    fn select_actions(&mut self, observations: &Observations) -> Actions;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
