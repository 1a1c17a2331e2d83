use thiserror::Error;

/// Errors raised while constructing an environment.
///
/// Per-step operations never fail; everything here is detected before the
/// first step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("Environment parameter \"{0}\" not supplied")]
    MissingParameter(String),

    #[error("Environment parameter \"{name}\" has invalid value {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("Unknown environment variant: {0}")]
    UnknownVariant(String),

    #[error("Merge layout references unknown edge: {0}")]
    UnknownEdge(String),
}
