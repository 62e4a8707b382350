//! Facade-level errors.

use ember_core::CoreError;
use ember_trade::TradeError;
use thiserror::Error;

/// Errors surfaced while assembling or configuring the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// World seed validation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A trade command was rejected.
    #[error(transparent)]
    Trade(#[from] TradeError),

    /// Configuration text did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("configuration io: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for facade results.
pub type SimResult<T> = Result<T, SimError>;
