//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use tradegate_domain::{Currency, CurrencyPair, Exchange};
use tradegate_okcoin::OkCoinConfig;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OKCoin connection settings
    pub okcoin: OkCoinSettings,

    /// Exchange that live orders are routed to
    pub order_destination: Exchange,

    /// Trading pair the gateway operates on
    pub pair: CurrencyPair,
}

/// OKCoin connection settings.
#[derive(Debug, Clone)]
pub struct OkCoinSettings {
    /// WebSocket endpoint
    pub ws_url: String,
    /// REST endpoint base
    pub http_url: String,
    /// Partner (account) identifier
    pub partner: String,
    /// Shared signing secret
    pub secret_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let okcoin = Self::load_okcoin_settings()?;
        let order_destination = Self::load_order_destination()?;
        let pair = Self::load_pair()?;

        Ok(Self {
            okcoin,
            order_destination,
            pair,
        })
    }

    /// Create test configuration. Points at unroutable local endpoints and
    /// routes orders nowhere.
    pub fn test() -> Self {
        Self {
            okcoin: OkCoinSettings {
                ws_url: "ws://127.0.0.1:9/ws".to_string(),
                http_url: "http://127.0.0.1:9".to_string(),
                partner: "test-partner".to_string(),
                secret_key: "test-secret".to_string(),
            },
            order_destination: Exchange::Null,
            pair: CurrencyPair::new(Currency::BTC, Currency::USD),
        }
    }

    /// Bundle the OKCoin settings for the gateway composer.
    pub fn okcoin_gateway_config(&self) -> OkCoinConfig {
        OkCoinConfig {
            ws_url: self.okcoin.ws_url.clone(),
            http_url: self.okcoin.http_url.clone(),
            partner: self.okcoin.partner.clone(),
            secret_key: self.okcoin.secret_key.clone(),
            order_destination: self.order_destination,
        }
    }

    fn load_okcoin_settings() -> DaemonResult<OkCoinSettings> {
        let ws_url = env::var("TRADEGATE_OKCOIN_WS_URL")
            .unwrap_or_else(|_| "wss://real.okcoin.com:10440/websocket/okcoinapi".to_string());
        let http_url = env::var("TRADEGATE_OKCOIN_HTTP_URL")
            .unwrap_or_else(|_| "https://www.okcoin.com/api/v1".to_string());

        let partner = env::var("TRADEGATE_OKCOIN_PARTNER")
            .map_err(|_| DaemonError::Config("TRADEGATE_OKCOIN_PARTNER is not set".to_string()))?;
        let secret_key = env::var("TRADEGATE_OKCOIN_SECRET_KEY").map_err(|_| {
            DaemonError::Config("TRADEGATE_OKCOIN_SECRET_KEY is not set".to_string())
        })?;

        Ok(OkCoinSettings {
            ws_url,
            http_url,
            partner,
            secret_key,
        })
    }

    fn load_pair() -> DaemonResult<CurrencyPair> {
        match env::var("TRADEGATE_PAIR") {
            Ok(symbol) => Ok(CurrencyPair::from_symbol(&symbol)?),
            Err(_) => Ok(CurrencyPair::new(Currency::BTC, Currency::USD)),
        }
    }

    fn load_order_destination() -> DaemonResult<Exchange> {
        let dest = env::var("TRADEGATE_ORDER_DESTINATION").unwrap_or_else(|_| "null".to_string());

        match dest.to_lowercase().as_str() {
            "okcoin" => Ok(Exchange::OkCoin),
            "null" | "none" => Ok(Exchange::Null),
            other => Err(DaemonError::Config(format!(
                "Invalid TRADEGATE_ORDER_DESTINATION: {}. Expected: okcoin, null",
                other
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
