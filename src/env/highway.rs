//! The multi-agent partially-observed highway environment.

use tracing::{debug, info};

use super::actions;
use super::config::{EnvParams, HighwayParams};
use super::error::EnvError;
use super::observation::ObservationEncoder;
use super::reward::{RewardContext, RewardStrategy};
use super::variant::EnvVariant;
use super::visibility;
use crate::kernel::{Kernel, NetworkKernel, Simulate, VehicleKernel};
use crate::spaces::BoxSpace;
use crate::{Actions, Observations, Rewards};

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Per-agent observations after the step.
    pub observations: Observations,
    /// Per-agent rewards; empty during warm-up.
    pub rewards: Rewards,
    /// Crash or horizon reached.
    pub done: bool,
    /// A simulator step reported a collision.
    pub crashed: bool,
    /// Number of environment steps taken since the last reset.
    pub time_step: u32,
}

/// Multi-agent highway environment.
///
/// Holds configuration and the selected encoder and reward strategy only.
/// The simulator is passed into each call, and nothing about individual
/// agents is remembered between steps.
///
/// # Lifecycle
///
/// 1. Build with [`MultiAgentHighwayEnv::new`] from parameters and a variant.
/// 2. Call [`MultiAgentHighwayEnv::reset`] with a freshly populated kernel.
/// 3. Call [`MultiAgentHighwayEnv::step`] until `done`.
#[derive(Debug, Clone)]
pub struct MultiAgentHighwayEnv {
    pub params: EnvParams,
    pub highway: HighwayParams,
    encoder: ObservationEncoder,
    strategy: RewardStrategy,
    time_step: u32,
}

impl MultiAgentHighwayEnv {
    /// Creates an environment for a registered variant.
    ///
    /// # Errors
    ///
    /// Returns an error if a required additional parameter is missing or
    /// invalid.
    pub fn new(params: EnvParams, variant: EnvVariant) -> Result<Self, EnvError> {
        let (encoder, strategy) = variant.parts();
        let env = Self::with_parts(params, encoder, strategy)?;
        info!(
            variant = %variant,
            obs_dim = env.encoder.dim(),
            max_accel = env.highway.max_accel,
            max_decel = env.highway.max_decel,
            evaluate = env.params.evaluate,
            "highway environment created"
        );
        Ok(env)
    }

    /// Creates an environment from an explicit encoder and strategy.
    pub fn with_parts(
        params: EnvParams,
        encoder: ObservationEncoder,
        strategy: RewardStrategy,
    ) -> Result<Self, EnvError> {
        let highway = HighwayParams::from_env_params(&params)?;
        Ok(Self {
            params,
            highway,
            encoder,
            strategy,
            time_step: 0,
        })
    }

    /// Checks that every edge the merge layout names exists in `network`.
    ///
    /// A no-op for encoders without merge information.
    pub fn validate_layout<N: NetworkKernel>(&self, network: &N) -> Result<(), EnvError> {
        let Some(layout) = self.encoder.merge_layout() else {
            return Ok(());
        };
        let named = std::iter::once(&layout.merge_edge)
            .chain(std::iter::once(&layout.reference_edge))
            .chain(layout.upstream_edges.iter());
        for edge in named {
            if network.edge_length(edge) < 0.0 {
                return Err(EnvError::UnknownEdge(edge.clone()));
            }
        }
        Ok(())
    }

    pub fn encoder(&self) -> &ObservationEncoder {
        &self.encoder
    }

    pub fn strategy(&self) -> &RewardStrategy {
        &self.strategy
    }

    pub fn time_step(&self) -> u32 {
        self.time_step
    }

    pub fn observation_space(&self) -> BoxSpace {
        self.encoder.observation_space()
    }

    pub fn action_space(&self) -> BoxSpace {
        actions::action_space(&self.highway)
    }

    /// Observations of every agent currently in the network.
    pub fn get_state<V, N>(&self, kernel: &Kernel<V, N>) -> Observations
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        self.encoder.encode(kernel)
    }

    /// Rewards for the current step.
    ///
    /// `actions == None` means the actions are unavailable this step, and the
    /// result is empty.
    pub fn compute_reward<V, N>(
        &self,
        kernel: &Kernel<V, N>,
        actions: Option<&Actions>,
        fail: bool,
    ) -> Rewards
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        if actions.is_none() {
            return Rewards::new();
        }
        let ctx = RewardContext {
            fail,
            evaluate: self.params.evaluate,
            target_velocity: self.highway.target_velocity,
        };
        self.strategy.compute(kernel, &ctx)
    }

    pub fn apply_rl_actions<V, N>(&self, kernel: &mut Kernel<V, N>, actions: Option<&Actions>)
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        actions::apply_rl_actions(kernel, actions);
    }

    /// Marks the vehicles the agents can see.
    pub fn additional_command<V, N>(&self, kernel: &mut Kernel<V, N>)
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        visibility::mark_observed(kernel);
    }

    /// Starts a new rollout on an already populated kernel.
    pub fn reset<V, N>(&mut self, kernel: &mut Kernel<V, N>) -> Observations
    where
        V: VehicleKernel,
        N: NetworkKernel,
    {
        self.time_step = 0;
        self.additional_command(kernel);
        self.get_state(kernel)
    }

    /// Advances the environment by one step.
    ///
    /// Actions are dispatched before each of the `sims_per_step` simulator
    /// steps. During the first `warmup_steps` steps actions are ignored and
    /// no rewards are produced.
    pub fn step<V, N>(&mut self, kernel: &mut Kernel<V, N>, actions: Option<&Actions>) -> StepResult
    where
        V: VehicleKernel,
        N: NetworkKernel,
        Kernel<V, N>: Simulate,
    {
        let actions = if self.time_step < self.params.warmup_steps {
            debug!(time_step = self.time_step, "warm-up step, actions ignored");
            None
        } else {
            actions
        };

        let mut crashed = false;
        for _ in 0..self.params.sims_per_step.max(1) {
            self.apply_rl_actions(kernel, actions);
            if kernel.simulation_step() {
                crashed = true;
                break;
            }
        }
        self.time_step += 1;

        let observations = self.get_state(kernel);
        let rewards = self.compute_reward(kernel, actions, crashed);
        self.additional_command(kernel);
        debug!(
            time_step = self.time_step,
            agents = observations.len(),
            rewarded = rewards.len(),
            "step complete"
        );

        let done = crashed || self.time_step >= self.params.horizon;
        if crashed {
            info!(time_step = self.time_step, "collision, rollout terminated");
        }

        StepResult {
            observations,
            rewards,
            done,
            crashed,
            time_step: self.time_step,
        }
    }
}
