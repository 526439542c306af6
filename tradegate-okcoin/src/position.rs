//! OKCoin position adapter.
//!
//! OKCoin has no balance push channel, so positions are polled: every tick
//! the account info endpoint is queried and one snapshot per currency is
//! emitted. A failed tick is logged and skipped; the next tick starts fresh.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

use tradegate_domain::{Currency, CurrencyPosition, Timestamped};
use tradegate_gateway::{GatewayError, GatewayResult, PositionGateway};

use crate::rest::OkCoinRestClient;

/// REST action for account balances.
const USER_INFO_ACTION: &str = "userinfo.do";

/// Seconds between polling ticks.
const POLL_INTERVAL_SECS: u64 = 15;

/// Account info response: per-currency free and held funds.
#[derive(Debug, Deserialize)]
struct OkCoinUserInfo {
    info: OkCoinAccountInfo,
}

#[derive(Debug, Deserialize)]
struct OkCoinAccountInfo {
    funds: OkCoinFunds,
}

#[derive(Debug, Deserialize)]
struct OkCoinFunds {
    free: BTreeMap<String, Decimal>,
    #[serde(default)]
    freezed: BTreeMap<String, Decimal>,
}

/// Convert one account info response into per-currency snapshots.
///
/// The free map drives the iteration; held amounts come from the freezed map
/// keyed by the same code, defaulting to zero when the exchange omits the
/// entry.
///
/// # Errors
/// - `Protocol` when the response does not carry the funds structure
/// - `Configuration` when a currency code falls outside the canonical set;
///   the whole tick is discarded rather than emitting a partial view
fn positions_from_response(frame: &Timestamped<Value>) -> GatewayResult<Vec<CurrencyPosition>> {
    let info: OkCoinUserInfo = serde_json::from_value(frame.data.clone())
        .map_err(|e| GatewayError::Protocol(format!("undecodable account info: {}", e)))?;

    let funds = info.info.funds;
    let mut positions = Vec::with_capacity(funds.free.len());
    for (code, available) in funds.free {
        let currency = Currency::from_code(&code)?;
        let held = funds.freezed.get(&code).copied().unwrap_or(Decimal::ZERO);
        positions.push(CurrencyPosition::new(currency, available, held));
    }

    Ok(positions)
}

/// Position capability over polled REST account info.
pub struct OkCoinPositionGateway {
    position_tx: broadcast::Sender<CurrencyPosition>,
}

impl OkCoinPositionGateway {
    /// Create the adapter and start its polling loop.
    pub fn new(http: Arc<OkCoinRestClient>) -> Arc<Self> {
        let (position_tx, _) = broadcast::channel(64);

        let gateway = Arc::new(Self { position_tx });

        let this = gateway.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                this.poll(&http).await;
            }
        });

        gateway
    }

    /// Run one polling tick. Failures end the tick, not the loop.
    async fn poll(&self, http: &OkCoinRestClient) {
        let frame = match http.post(USER_INFO_ACTION, BTreeMap::new()).await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "position poll failed");
                return;
            }
        };

        match positions_from_response(&frame) {
            Ok(positions) => {
                for position in positions {
                    let _ = self.position_tx.send(position);
                }
            }
            Err(e) => {
                warn!(error = %e, "discarding position tick");
            }
        }
    }
}

impl PositionGateway for OkCoinPositionGateway {
    fn positions(&self) -> broadcast::Receiver<CurrencyPosition> {
        self.position_tx.subscribe()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn timestamped(value: Value) -> Timestamped<Value> {
        Timestamped::new(value, Utc::now())
    }

    #[test]
    fn test_positions_pair_free_with_freezed() {
        let frame = timestamped(serde_json::json!({
            "result": true,
            "info": {"funds": {
                "free": {"btc": "1.5", "usd": "1000"},
                "freezed": {"btc": "0.25", "usd": "0"},
            }},
        }));

        let positions = positions_from_response(&frame).unwrap();

        assert_eq!(positions.len(), 2);
        assert!(positions
            .contains(&CurrencyPosition::new(Currency::BTC, dec!(1.5), dec!(0.25))));
        assert!(positions.contains(&CurrencyPosition::new(Currency::USD, dec!(1000), dec!(0))));
    }

    #[test]
    fn test_missing_freezed_entry_defaults_to_zero_held() {
        let frame = timestamped(serde_json::json!({
            "info": {"funds": {
                "free": {"ltc": "3"},
                "freezed": {},
            }},
        }));

        let positions = positions_from_response(&frame).unwrap();

        assert_eq!(
            positions,
            vec![CurrencyPosition::new(Currency::LTC, dec!(3), dec!(0))]
        );
    }

    #[test]
    fn test_unknown_currency_discards_the_whole_tick() {
        let frame = timestamped(serde_json::json!({
            "info": {"funds": {
                "free": {"btc": "1", "doge": "9000"},
                "freezed": {},
            }},
        }));

        let err = positions_from_response(&frame).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn test_malformed_account_info_is_a_protocol_error() {
        let frame = timestamped(serde_json::json!({"result": false}));
        assert!(matches!(
            positions_from_response(&frame),
            Err(GatewayError::Protocol(_))
        ));
    }
}
