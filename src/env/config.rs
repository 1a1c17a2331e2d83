//! Environment configuration.

use std::collections::HashMap;

use super::error::EnvError;

/// Required additional parameters and their default values.
///
/// - `max_accel`: maximum acceleration of autonomous vehicles, m/s²
/// - `max_decel`: maximum deceleration of autonomous vehicles, m/s²
/// - `target_velocity`: desired velocity for all vehicles in the network, m/s
pub const ADDITIONAL_ENV_PARAMS: [(&str, f64); 3] = [
    ("max_accel", 1.0),
    ("max_decel", 1.0),
    ("target_velocity", 25.0),
];

/// Environment parameters handed over by the training harness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvParams {
    /// Variant-specific parameters, validated at construction.
    pub additional_params: HashMap<String, f64>,
    /// Benchmark mode: rewards become raw agent speeds.
    pub evaluate: bool,
    /// Number of environment steps per rollout.
    pub horizon: u32,
    /// Steps run before control starts; actions are ignored during them.
    pub warmup_steps: u32,
    /// Simulator steps per environment step.
    pub sims_per_step: u32,
}

impl Default for EnvParams {
    fn default() -> Self {
        Self {
            additional_params: HashMap::new(),
            evaluate: false,
            horizon: 1500,
            warmup_steps: 0,
            sims_per_step: 1,
        }
    }
}

impl EnvParams {
    /// Parameters with every entry of [`ADDITIONAL_ENV_PARAMS`] at its default.
    pub fn with_defaults() -> Self {
        let additional_params = ADDITIONAL_ENV_PARAMS
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        Self {
            additional_params,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.additional_params.insert(name.to_string(), value);
        self
    }

    pub fn with_evaluate(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }

    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_warmup_steps(mut self, warmup_steps: u32) -> Self {
        self.warmup_steps = warmup_steps;
        self
    }

    fn require(&self, name: &str) -> Result<f64, EnvError> {
        let value = *self
            .additional_params
            .get(name)
            .ok_or_else(|| EnvError::MissingParameter(name.to_string()))?;
        if !value.is_finite() {
            return Err(EnvError::InvalidParameter {
                name: name.to_string(),
                value,
            });
        }
        Ok(value)
    }
}

/// Validated highway parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighwayParams {
    pub max_accel: f64,
    /// Stored as given; the action space uses its magnitude.
    pub max_decel: f64,
    pub target_velocity: f64,
}

impl HighwayParams {
    /// Extracts and checks the required parameters.
    ///
    /// # Errors
    ///
    /// - `MissingParameter` for the first required key that is absent
    /// - `InvalidParameter` for non-finite values or a negative `max_accel`
    pub fn from_env_params(params: &EnvParams) -> Result<Self, EnvError> {
        for (name, _) in ADDITIONAL_ENV_PARAMS {
            if !params.additional_params.contains_key(name) {
                return Err(EnvError::MissingParameter(name.to_string()));
            }
        }

        let max_accel = params.require("max_accel")?;
        if max_accel < 0.0 {
            return Err(EnvError::InvalidParameter {
                name: "max_accel".into(),
                value: max_accel,
            });
        }

        Ok(Self {
            max_accel,
            max_decel: params.require("max_decel")?,
            target_velocity: params.require("target_velocity")?,
        })
    }
}
