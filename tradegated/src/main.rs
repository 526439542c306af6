//! Tradegate Daemon
//!
//! Exchange gateway runtime: connects to OKCoin, exposes the canonical event
//! streams, and serves downstream order consumers.
//!
//! # Usage
//!
//! ```bash
//! # Market data and positions only, no live order routing
//! TRADEGATE_OKCOIN_PARTNER=... TRADEGATE_OKCOIN_SECRET_KEY=... cargo run -p tradegated
//!
//! # Route live orders to OKCoin
//! TRADEGATE_ORDER_DESTINATION=okcoin cargo run -p tradegated
//! ```
//!
//! # Environment Variables
//!
//! - `TRADEGATE_OKCOIN_WS_URL`: WebSocket endpoint (default: OKCoin production)
//! - `TRADEGATE_OKCOIN_HTTP_URL`: REST endpoint base (default: OKCoin production)
//! - `TRADEGATE_OKCOIN_PARTNER`: partner (account) identifier (required)
//! - `TRADEGATE_OKCOIN_SECRET_KEY`: shared signing secret (required)
//! - `TRADEGATE_ORDER_DESTINATION`: okcoin or null (default: null)
//! - `TRADEGATE_PAIR`: trading pair, `BASE/QUOTE` or `base_quote` (default: BTC/USD)

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradegated::{Config, OrderEventHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tradegated=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pair = %config.pair,
        order_destination = %config.order_destination,
        "Tradegate Daemon"
    );

    let gateway = tradegate_okcoin::create_gateway(config.okcoin_gateway_config());
    let hub = OrderEventHub::new(config.pair, gateway.order_entry.clone());

    info!(
        exchange = gateway.details.name(),
        maker_fee = %gateway.details.maker_fee(),
        taker_fee = %gateway.details.taker_fee(),
        "gateway composed"
    );

    let mut connectivity = gateway.market_data.connectivity();
    let mut market_data = gateway.market_data.market_data();
    let mut positions = gateway.positions.positions();
    let mut order_updates = hub.updates();

    loop {
        tokio::select! {
            status = connectivity.recv() => match status {
                Ok(status) => info!(%status, "market data connectivity"),
                Err(e) => warn!(error = %e, "connectivity stream error"),
            },
            market = market_data.recv() => match market {
                Ok(market) => debug!(
                    bids = market.bids.len(),
                    asks = market.asks.len(),
                    time = %market.time,
                    "book snapshot"
                ),
                Err(e) => warn!(error = %e, "market data stream error"),
            },
            position = positions.recv() => match position {
                Ok(position) => info!(
                    currency = %position.currency,
                    available = %position.available,
                    held = %position.held,
                    "position"
                ),
                Err(e) => warn!(error = %e, "position stream error"),
            },
            update = order_updates.recv() => match update {
                Ok(update) => info!(
                    pair = %update.pair,
                    order_id = ?update.report.order_id,
                    status = %update.report.status,
                    "order update"
                ),
                Err(e) => warn!(error = %e, "order update stream error"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    Ok(())
}
