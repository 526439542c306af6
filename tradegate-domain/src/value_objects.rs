//! Value Objects for the Tradegate Domain
//!
//! Immutable domain primitives shared by every gateway: connectivity status,
//! currencies, exchange identifiers, and the timestamped payload envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Currency code is not part of the canonical currency set
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Currency pair could not be parsed
    #[error("Invalid currency pair: {0}")]
    InvalidPair(String),
}

// =============================================================================
// ConnectivityStatus
// =============================================================================

/// Connectivity of a gateway's underlying transport.
///
/// Emitted by the socket layer on open/close and re-emitted verbatim by
/// every adapter to its own listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityStatus {
    /// Transport is up
    Connected,
    /// Transport is down
    Disconnected,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityStatus::Connected => write!(f, "Connected"),
            ConnectivityStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

// =============================================================================
// Timestamped
// =============================================================================

/// A payload paired with the time it was captured.
///
/// Socket frames carry the arrival timestamp recorded before any parsing;
/// REST responses carry the receipt timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    /// The wrapped payload
    pub data: T,
    /// Capture time
    pub time: DateTime<Utc>,
}

impl<T> Timestamped<T> {
    /// Wrap a payload with its capture time.
    pub fn new(data: T, time: DateTime<Utc>) -> Self {
        Self { data, time }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Canonical currency enumeration.
///
/// Gateways must convert exchange currency codes into this set; codes outside
/// it cannot be represented safely and are a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// US dollar
    USD,
    /// Bitcoin
    BTC,
    /// Litecoin
    LTC,
}

impl Currency {
    /// Convert an exchange currency code (case-insensitive) to the canonical
    /// enumeration.
    ///
    /// # Errors
    /// Returns `DomainError::UnsupportedCurrency` for unrecognized codes.
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code.to_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "btc" => Ok(Currency::BTC),
            "ltc" => Ok(Currency::LTC),
            other => Err(DomainError::UnsupportedCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::USD => write!(f, "USD"),
            Currency::BTC => write!(f, "BTC"),
            Currency::LTC => write!(f, "LTC"),
        }
    }
}

// =============================================================================
// CurrencyPair
// =============================================================================

/// A traded currency pair (base/quote).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (the one being bought or sold)
    pub base: Currency,
    /// Quote currency (the one prices are denominated in)
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Parse a pair symbol in `BASE/QUOTE` or `base_quote` form.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPair` when no separator is present and
    /// `DomainError::UnsupportedCurrency` when either leg falls outside the
    /// canonical currency set.
    pub fn from_symbol(symbol: &str) -> Result<Self, DomainError> {
        let (base, quote) = symbol
            .split_once('/')
            .or_else(|| symbol.split_once('_'))
            .ok_or_else(|| DomainError::InvalidPair(symbol.to_string()))?;

        Ok(Self::new(
            Currency::from_code(base)?,
            Currency::from_code(quote)?,
        ))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

// =============================================================================
// Exchange
// =============================================================================

/// Canonical exchange identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// OKCoin
    OkCoin,
    /// No-op gateway (order routing disabled)
    Null,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::OkCoin => write!(f, "OkCoin"),
            Exchange::Null => write!(f, "Null"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("usd").unwrap(), Currency::USD);
        assert_eq!(Currency::from_code("BTC").unwrap(), Currency::BTC);
        assert_eq!(Currency::from_code("Ltc").unwrap(), Currency::LTC);
    }

    #[test]
    fn test_currency_from_code_unknown() {
        let err = Currency::from_code("doge").unwrap_err();
        assert_eq!(err, DomainError::UnsupportedCurrency("doge".to_string()));
    }

    #[test]
    fn test_currency_pair_display() {
        let pair = CurrencyPair::new(Currency::BTC, Currency::USD);
        assert_eq!(pair.to_string(), "BTC/USD");
    }

    #[test]
    fn test_currency_pair_from_symbol() {
        let pair = CurrencyPair::new(Currency::BTC, Currency::USD);
        assert_eq!(CurrencyPair::from_symbol("BTC/USD").unwrap(), pair);
        assert_eq!(CurrencyPair::from_symbol("btc_usd").unwrap(), pair);
    }

    #[test]
    fn test_currency_pair_from_symbol_without_separator() {
        let err = CurrencyPair::from_symbol("btcusd").unwrap_err();
        assert_eq!(err, DomainError::InvalidPair("btcusd".to_string()));
    }

    #[test]
    fn test_currency_pair_from_symbol_unknown_leg() {
        let err = CurrencyPair::from_symbol("doge/usd").unwrap_err();
        assert_eq!(err, DomainError::UnsupportedCurrency("doge".to_string()));
    }

    #[test]
    fn test_timestamped_wraps_payload() {
        let time = Utc::now();
        let ts = Timestamped::new(42u32, time);
        assert_eq!(ts.data, 42);
        assert_eq!(ts.time, time);
    }

    #[test]
    fn test_connectivity_status_serialization() {
        let json = serde_json::to_string(&ConnectivityStatus::Connected).unwrap();
        let parsed: ConnectivityStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ConnectivityStatus::Connected);
    }
}
