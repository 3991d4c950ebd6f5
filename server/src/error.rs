use crate::config::ConfigError;
use shared::ProtocolError;
use thiserror::Error;

/// Failures surfaced by the server library
///
/// None of these are raised for bad player input; those are answered on the
/// connection and the session carries on.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
