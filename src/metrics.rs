//! Evaluation metrics for the highway environment.
//!
//! Runs full rollouts of a policy and aggregates episode-level statistics.

use std::fmt;

use tracing::debug;

use crate::env::MultiAgentHighwayEnv;
use crate::kernel::{Kernel, NetworkKernel, Simulate, VehicleKernel};
use crate::policy::Policy;
use crate::rewards::average_velocity;

/// Aggregated evaluation metrics over multiple episodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean reward per agent-step.
    pub mean_agent_reward: f64,
    /// Mean summed reward per episode.
    pub mean_episode_return: f64,
    /// Mean network-wide speed over all steps, m/s.
    pub mean_speed: f64,
    /// Fraction of episodes that ended in a collision.
    pub crash_rate: f64,
    /// Mean number of steps per episode.
    pub mean_steps: f64,
    /// Number of episodes evaluated.
    pub n_episodes: usize,
}

#[derive(Debug, Default)]
struct EpisodeStats {
    total_reward: f64,
    agent_steps: usize,
    speed_sum: f64,
    steps: u32,
    crashed: bool,
}

impl EvaluationMetrics {
    /// Evaluates a policy over multiple episodes.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment to evaluate in
    /// * `make_kernel` - Builds the populated kernel for episode `i`
    /// * `policy` - The policy to evaluate
    /// * `n_episodes` - Number of episodes to run
    pub fn evaluate<V, N, F>(
        env: &mut MultiAgentHighwayEnv,
        mut make_kernel: F,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Self
    where
        V: VehicleKernel,
        N: NetworkKernel,
        Kernel<V, N>: Simulate,
        F: FnMut(usize) -> Kernel<V, N>,
    {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for episode in 0..n_episodes {
            let mut kernel = make_kernel(episode);
            let mut obs = env.reset(&mut kernel);
            let mut stats = EpisodeStats::default();

            loop {
                let actions = policy.select_actions(&obs);
                let result = env.step(&mut kernel, Some(&actions));

                stats.total_reward += result.rewards.values().sum::<f64>();
                stats.agent_steps += result.rewards.len();
                stats.speed_sum += average_velocity(&kernel.vehicle, false);
                stats.steps = result.time_step;
                obs = result.observations;

                if result.done {
                    stats.crashed = result.crashed;
                    break;
                }
            }

            debug!(
                episode,
                steps = stats.steps,
                crashed = stats.crashed,
                total_reward = stats.total_reward,
                "episode finished"
            );
            all_stats.push(stats);
        }

        let n = all_stats.len().max(1) as f64;
        let agent_steps: usize = all_stats.iter().map(|s| s.agent_steps).sum();
        let total_reward: f64 = all_stats.iter().map(|s| s.total_reward).sum();
        let total_steps: u32 = all_stats.iter().map(|s| s.steps).sum();

        let mean_agent_reward = if agent_steps > 0 {
            total_reward / agent_steps as f64
        } else {
            0.0
        };
        let mean_speed = if total_steps > 0 {
            all_stats.iter().map(|s| s.speed_sum).sum::<f64>() / total_steps as f64
        } else {
            0.0
        };

        Self {
            mean_agent_reward,
            mean_episode_return: total_reward / n,
            mean_speed,
            crash_rate: all_stats.iter().filter(|s| s.crashed).count() as f64 / n,
            mean_steps: total_steps as f64 / n,
            n_episodes,
        }
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} episodes) ===",
            self.n_episodes
        )?;
        writeln!(f, "  Mean reward per agent:   {:.4}", self.mean_agent_reward)?;
        writeln!(f, "  Mean episode return:     {:.2}", self.mean_episode_return)?;
        writeln!(f, "  Mean speed:              {:.2} m/s", self.mean_speed)?;
        writeln!(f, "  Crash rate:              {:.1}%", self.crash_rate * 100.0)?;
        writeln!(f, "  Mean steps:              {:.1}", self.mean_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnvParams, EnvVariant};
    use crate::kernel::{MemoryNetwork, MemoryVehicles, VehicleRecord};
    use crate::policy::{ConstantPolicy, RandomPolicy};
    use crate::scenarios::{merge_kernel, spawn_platoon, MergeNetworkParams};

    fn platoon(_episode: usize) -> Kernel<MemoryVehicles, MemoryNetwork> {
        let mut k = merge_kernel(&MergeNetworkParams::default()).unwrap();
        spawn_platoon(&mut k, "left", 5, 25.0, 15.0, 2).unwrap();
        k
    }

    #[test]
    fn evaluate_completes() {
        let mut env = MultiAgentHighwayEnv::new(
            EnvParams::with_defaults().with_horizon(10),
            EnvVariant::HighwayPo,
        )
        .unwrap();
        let mut policy = RandomPolicy::seeded(env.action_space(), 3);
        let metrics = EvaluationMetrics::evaluate(&mut env, platoon, &mut policy, 3);
        assert_eq!(metrics.n_episodes, 3);
        assert!(metrics.mean_steps <= 10.0);
    }

    #[test]
    fn cruising_platoon_never_crashes() {
        let mut env = MultiAgentHighwayEnv::new(
            EnvParams::with_defaults().with_horizon(5),
            EnvVariant::HighwayPoNegative,
        )
        .unwrap();
        let metrics =
            EvaluationMetrics::evaluate(&mut env, platoon, &mut ConstantPolicy::new(0.0), 2);
        assert_eq!(metrics.crash_rate, 0.0);
        assert_eq!(metrics.mean_steps, 5.0);
        assert!((metrics.mean_speed - 15.0).abs() < 1e-9);
        assert!((metrics.mean_agent_reward + 0.1).abs() < 1e-12);
    }

    #[test]
    fn crash_counted() {
        let mut env = MultiAgentHighwayEnv::new(
            EnvParams::with_defaults().with_horizon(50),
            EnvVariant::HighwayPo,
        )
        .unwrap();
        let blocked = |_: usize| {
            let mut k = merge_kernel(&MergeNetworkParams::default()).unwrap();
            k.add_vehicle(Some("wall".into()), VehicleRecord::human("left", 0, 60.0, 0.0))
                .unwrap();
            k.add_vehicle(Some("rl".into()), VehicleRecord::rl("left", 0, 40.0, 10.0))
                .unwrap();
            k
        };
        let metrics =
            EvaluationMetrics::evaluate(&mut env, blocked, &mut ConstantPolicy::new(0.0), 1);
        assert_eq!(metrics.crash_rate, 1.0);
        assert!(metrics.mean_steps < 50.0);
    }

    #[test]
    fn display_lists_episode_count() {
        let metrics = EvaluationMetrics {
            mean_agent_reward: 0.1,
            mean_episode_return: 2.0,
            mean_speed: 20.0,
            crash_rate: 0.5,
            mean_steps: 10.0,
            n_episodes: 4,
        };
        assert!(metrics.to_string().contains("4 episodes"));
    }
}
