//! Gateway error taxonomy.
//!
//! Three classes cover everything this layer can fail with:
//!
//! - `Transport`: socket/HTTP I/O failure. Logged and surfaced as a Rejected
//!   order or a dropped position tick, never fatal to the event loop.
//! - `Protocol`: unparseable or unrouteable payload. Logged with the raw
//!   content; socket parse failures are escalated to the connection manager,
//!   which may reconnect.
//! - `Configuration`: unsupported side/type combination, unknown currency
//!   code. Fatal to the call that triggered it, not to the process.
//!
//! No retries exist anywhere in this layer; any retry/backoff policy is a
//! deliberate future addition.

use thiserror::Error;
use tradegate_domain::DomainError;

/// Errors that can occur in a gateway implementation.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Socket or HTTP I/O failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Unparseable or unrouteable payload
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Request cannot be represented on this exchange
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_maps_to_configuration() {
        let err: GatewayError =
            tradegate_domain::Currency::from_code("doge").unwrap_err().into();
        assert!(matches!(err, GatewayError::Configuration(_)));
        assert!(err.to_string().contains("doge"));
    }
}
