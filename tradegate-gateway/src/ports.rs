//! Gateway port definitions.
//!
//! Ports define the uniform contract every exchange implementation satisfies.
//! Event-carrying ports hand out `tokio::sync::broadcast` receivers: the
//! implementation owns the sender, subscribers fan out independently, and a
//! receiver obtained after an event was sent simply never sees it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::broadcast;

use tradegate_domain::{
    BrokeredCancel, BrokeredOrder, BrokeredReplace, ConnectivityStatus, CurrencyPosition,
    Exchange, Market, OrderGatewayActionReport, OrderStatusReport,
};

use crate::error::GatewayResult;

// =============================================================================
// Market Data
// =============================================================================

/// Port for canonical market depth snapshots.
///
/// Implementations:
/// - `OkCoinMarketDataGateway` - depth channel over the multiplexed socket
pub trait MarketDataGateway: Send + Sync {
    /// Subscribe to book snapshots. One snapshot per depth frame, exchange
    /// ordering preserved; each snapshot carries its frame's capture time.
    fn market_data(&self) -> broadcast::Receiver<Market>;

    /// Subscribe to connectivity transitions, re-emitted verbatim from the
    /// underlying transport.
    fn connectivity(&self) -> broadcast::Receiver<ConnectivityStatus>;
}

// =============================================================================
// Order Entry
// =============================================================================

/// Port for order entry.
///
/// The three command operations acknowledge *submission* immediately;
/// exchange acceptance (or rejection) arrives later on `order_updates`.
///
/// Implementations:
/// - `OkCoinOrderEntryGateway` - signed REST commands + ExecRpt channel
/// - `NullOrderGateway` - no-op stand-in when this exchange is not the
///   configured order destination
#[async_trait]
pub trait OrderEntryGateway: Send + Sync {
    /// Submit a new order.
    ///
    /// # Errors
    /// Fails synchronously with `Configuration` when the side/type pair has
    /// no representation on this exchange. Transport failures surface later
    /// as a Rejected status report, never as an error here.
    async fn send_order(&self, order: &BrokeredOrder) -> GatewayResult<OrderGatewayActionReport>;

    /// Submit a cancel for an existing order.
    ///
    /// A refused cancel surfaces as a Rejected report with the
    /// `cancel_rejected` flag set.
    async fn cancel_order(
        &self,
        cancel: &BrokeredCancel,
    ) -> GatewayResult<OrderGatewayActionReport>;

    /// Submit a cancel-replace.
    ///
    /// Implemented as cancel-then-send and deliberately not atomic: the
    /// caller observes two independent status events and reconciles state
    /// itself, even when one leg fails.
    async fn replace_order(
        &self,
        replace: &BrokeredReplace,
    ) -> GatewayResult<OrderGatewayActionReport>;

    /// Subscribe to canonical order status reports.
    fn order_updates(&self) -> broadcast::Receiver<OrderStatusReport>;

    /// Subscribe to connectivity transitions.
    fn connectivity(&self) -> broadcast::Receiver<ConnectivityStatus>;

    /// Generate a client order id for exchanges that require one up front.
    /// Uniqueness is best-effort, not guaranteed.
    fn generate_client_order_id(&self) -> String;

    /// Whether cancels address orders by client id rather than exchange id.
    fn cancels_by_client_order_id(&self) -> bool;
}

// =============================================================================
// Positions
// =============================================================================

/// Port for per-currency position events.
pub trait PositionGateway: Send + Sync {
    /// Subscribe to position snapshots. One event per currency per polling
    /// tick; a newer event supersedes the previous one for that currency.
    fn positions(&self) -> broadcast::Receiver<CurrencyPosition>;
}

// =============================================================================
// Exchange metadata
// =============================================================================

/// Static exchange metadata.
pub trait ExchangeDetails: Send + Sync {
    /// Human-readable exchange name.
    fn name(&self) -> &'static str;

    /// Fee rate charged when providing liquidity.
    fn maker_fee(&self) -> Decimal;

    /// Fee rate charged when taking liquidity.
    fn taker_fee(&self) -> Decimal;

    /// Whether the exchange prevents self-trades natively.
    fn has_self_trade_prevention(&self) -> bool;

    /// Canonical exchange identifier.
    fn exchange(&self) -> Exchange;
}

// =============================================================================
// Combined gateway
// =============================================================================

/// One exchange-facing object satisfying the whole gateway contract.
///
/// Produced by an exchange's composer; performs no protocol work itself.
pub struct CombinedGateway {
    /// Market data capability
    pub market_data: Arc<dyn MarketDataGateway>,
    /// Order entry capability (possibly a no-op stand-in)
    pub order_entry: Arc<dyn OrderEntryGateway>,
    /// Position capability
    pub positions: Arc<dyn PositionGateway>,
    /// Static exchange metadata
    pub details: Arc<dyn ExchangeDetails>,
}

impl CombinedGateway {
    /// Bind one implementation of each capability together.
    pub fn new(
        market_data: Arc<dyn MarketDataGateway>,
        order_entry: Arc<dyn OrderEntryGateway>,
        positions: Arc<dyn PositionGateway>,
        details: Arc<dyn ExchangeDetails>,
    ) -> Self {
        Self {
            market_data,
            order_entry,
            positions,
            details,
        }
    }
}
