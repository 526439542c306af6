//! Tradegate OKCoin Gateway
//!
//! OKCoin implementation of the gateway contract: a multiplexed WebSocket
//! client for market data and execution reports, a signed REST client for
//! order commands and balances, and adapters translating both wire protocols
//! into the canonical domain model.
//!
//! [`create_gateway`] composes the pieces into one [`CombinedGateway`]. When
//! OKCoin is not the configured order destination, order entry is replaced by
//! the no-op [`NullOrderGateway`] while market data and positions stay live.
//!
//! [`NullOrderGateway`]: tradegate_gateway::NullOrderGateway

pub mod market_data;
pub mod order_entry;
pub mod position;
pub mod rest;
pub mod socket;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use tradegate_domain::Exchange;
use tradegate_gateway::{CombinedGateway, ExchangeDetails, NullOrderGateway, OrderEntryGateway};

use crate::market_data::OkCoinMarketDataGateway;
use crate::order_entry::OkCoinOrderEntryGateway;
use crate::position::OkCoinPositionGateway;
use crate::rest::OkCoinRestClient;
use crate::socket::OkCoinSocket;

/// Connection and credential settings for the OKCoin gateway.
#[derive(Debug, Clone)]
pub struct OkCoinConfig {
    /// WebSocket endpoint
    pub ws_url: String,
    /// REST endpoint base
    pub http_url: String,
    /// Partner (account) identifier
    pub partner: String,
    /// Shared signing secret
    pub secret_key: String,
    /// Exchange that live orders are routed to
    pub order_destination: Exchange,
}

/// Static OKCoin metadata.
pub struct OkCoinDetails;

impl ExchangeDetails for OkCoinDetails {
    fn name(&self) -> &'static str {
        "OkCoin"
    }

    fn maker_fee(&self) -> Decimal {
        dec!(0.001)
    }

    fn taker_fee(&self) -> Decimal {
        dec!(0.002)
    }

    fn has_self_trade_prevention(&self) -> bool {
        false
    }

    fn exchange(&self) -> Exchange {
        Exchange::OkCoin
    }
}

/// Compose the full OKCoin gateway and start its background tasks.
///
/// Spawns the socket lifecycle loop and the position polling loop; the
/// returned gateway is live immediately, with connectivity events arriving
/// once the socket connects.
pub fn create_gateway(config: OkCoinConfig) -> CombinedGateway {
    let socket = OkCoinSocket::new(
        config.ws_url.clone(),
        config.partner.clone(),
        config.secret_key.clone(),
    );
    let http = Arc::new(OkCoinRestClient::new(
        config.http_url.clone(),
        config.partner.clone(),
        config.secret_key.clone(),
    ));

    let market_data = OkCoinMarketDataGateway::new(socket.clone());
    let positions = OkCoinPositionGateway::new(http.clone());

    let order_entry: Arc<dyn OrderEntryGateway> = if config.order_destination == Exchange::OkCoin {
        OkCoinOrderEntryGateway::new(socket.clone(), http)
    } else {
        info!(
            destination = %config.order_destination,
            "order routing disabled for OkCoin, using null order gateway"
        );
        NullOrderGateway::new()
    };

    tokio::spawn(socket.run());

    CombinedGateway::new(market_data, order_entry, positions, Arc::new(OkCoinDetails))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(order_destination: Exchange) -> OkCoinConfig {
        OkCoinConfig {
            ws_url: "wss://example.invalid/ws".to_string(),
            http_url: "http://127.0.0.1:9".to_string(),
            partner: "partner".to_string(),
            secret_key: "secret".to_string(),
            order_destination,
        }
    }

    #[test]
    fn test_details() {
        let details = OkCoinDetails;
        assert_eq!(details.name(), "OkCoin");
        assert_eq!(details.maker_fee(), dec!(0.001));
        assert_eq!(details.taker_fee(), dec!(0.002));
        assert!(!details.has_self_trade_prevention());
        assert_eq!(details.exchange(), Exchange::OkCoin);
    }

    #[tokio::test]
    async fn test_composer_substitutes_null_order_entry() {
        // Live order entry generates random alphanumeric ids; the null
        // stand-in generates "null-N" ids
        let live = create_gateway(config(Exchange::OkCoin));
        assert!(!live.order_entry.generate_client_order_id().starts_with("null-"));

        let disabled = create_gateway(config(Exchange::Null));
        assert!(disabled.order_entry.generate_client_order_id().starts_with("null-"));
    }
}
