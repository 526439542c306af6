//! Daemon error types.

use thiserror::Error;
use tradegate_domain::DomainError;
use tradegate_gateway::GatewayError;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A consumer command could not be translated into a gateway call
    #[error("Invalid consumer command: {0}")]
    InvalidCommand(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
