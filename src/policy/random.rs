//! Random policy for testing and baselines.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::trait_::Policy;
use crate::spaces::BoxSpace;
use crate::{Actions, Observations};

/// Uniformly random accelerations.
///
/// Each agent independently samples from the action space. Used for sanity
/// checks and as a lower-bound baseline.
pub struct RandomPolicy {
    action_space: BoxSpace,
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a random policy seeded from system entropy.
    pub fn new(action_space: BoxSpace) -> Self {
        Self {
            action_space,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a random policy with a fixed seed for reproducible rollouts.
    pub fn seeded(action_space: BoxSpace, seed: u64) -> Self {
        Self {
            action_space,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_actions(&mut self, observations: &Observations) -> Actions {
        observations
            .keys()
            .map(|id| (id.clone(), self.action_space.sample(&mut self.rng)))
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(n: usize) -> Observations {
        (0..n).map(|i| (format!("rl_{i}"), vec![0.0; 5])).collect()
    }

    #[test]
    fn random_policy_returns_one_action_per_agent() {
        let mut policy = RandomPolicy::new(BoxSpace::new(vec![-1.0], vec![1.0]));
        let actions = policy.select_actions(&obs(4));
        assert_eq!(actions.len(), 4);
        assert!(actions.contains_key("rl_3"));
    }

    #[test]
    fn random_policy_actions_in_range() {
        let space = BoxSpace::new(vec![-3.0], vec![1.0]);
        let mut policy = RandomPolicy::seeded(space.clone(), 11);
        for a in policy.select_actions(&obs(100)).values() {
            assert!(space.contains(a));
        }
    }

    #[test]
    fn seeded_policies_agree() {
        let space = BoxSpace::new(vec![-1.0], vec![1.0]);
        let mut p1 = RandomPolicy::seeded(space.clone(), 5);
        let mut p2 = RandomPolicy::seeded(space, 5);
        assert_eq!(p1.select_actions(&obs(3)), p2.select_actions(&obs(3)));
    }
}
