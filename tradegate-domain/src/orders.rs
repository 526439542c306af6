//! Canonical order model.
//!
//! Order status is a primary state plus independent boolean flags
//! (pending-cancel, pending-replace, partially-filled, cancel-rejected) that
//! augment it. Numeric fields are populated only when the source carried a
//! meaningful value; absence is `None`, never zero, so a downstream consumer
//! can never misread "no fill" as "filled zero".

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Side / OrderType
// =============================================================================

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side
    Bid,
    /// Sell side
    Ask,
    /// Side could not be determined from the source
    Unknown,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "Bid"),
            Side::Ask => write!(f, "Ask"),
            Side::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Canonical order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Resting order at a limit price
    Limit,
    /// Immediate execution at market
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "Limit"),
            OrderType::Market => write!(f, "Market"),
        }
    }
}

// =============================================================================
// OrderStatus
// =============================================================================

/// Primary order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the gateway, not yet acknowledged by the exchange
    New,
    /// Live at the exchange
    Working,
    /// Fully filled
    Complete,
    /// Cancelled at the exchange
    Cancelled,
    /// Rejected by the exchange or the gateway
    Rejected,
    /// Exchange reported a state outside the canonical set
    Other,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "New"),
            OrderStatus::Working => write!(f, "Working"),
            OrderStatus::Complete => write!(f, "Complete"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
            OrderStatus::Rejected => write!(f, "Rejected"),
            OrderStatus::Other => write!(f, "Other"),
        }
    }
}

// =============================================================================
// OrderStatusReport
// =============================================================================

/// One canonical order state transition.
///
/// The adapter never mutates a past report; every transition produces a new
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    /// Client-assigned order id
    pub order_id: Option<String>,
    /// Exchange-assigned order id
    pub exchange_id: Option<String>,
    /// Side of the order, when the source carried it
    pub side: Side,
    /// Order type, when the source carried it
    pub order_type: Option<OrderType>,
    /// Primary state
    pub status: OrderStatus,
    /// When this transition was observed
    pub time: DateTime<Utc>,
    /// Quantity of the most recent fill, if any
    pub last_quantity: Option<Decimal>,
    /// Price of the most recent fill, if any
    pub last_price: Option<Decimal>,
    /// Quantity still open at the exchange (only while Working)
    pub leaves_quantity: Option<Decimal>,
    /// Total filled quantity, if any
    pub cum_quantity: Option<Decimal>,
    /// Average fill price, if any
    pub average_price: Option<Decimal>,
    /// A cancel has been sent but not yet confirmed
    pub pending_cancel: bool,
    /// A replace has been sent but not yet confirmed
    pub pending_replace: bool,
    /// Some quantity filled, some still open
    pub partially_filled: bool,
    /// The exchange refused a cancel request
    pub cancel_rejected: bool,
    /// Exchange-provided rejection detail, if any
    pub reject_message: Option<String>,
}

impl OrderStatusReport {
    /// Create a report with the given primary state and no identifiers,
    /// numerics, or flags set.
    pub fn new(status: OrderStatus, time: DateTime<Utc>) -> Self {
        Self {
            order_id: None,
            exchange_id: None,
            side: Side::Unknown,
            order_type: None,
            status,
            time,
            last_quantity: None,
            last_price: None,
            leaves_quantity: None,
            cum_quantity: None,
            average_price: None,
            pending_cancel: false,
            pending_replace: false,
            partially_filled: false,
            cancel_rejected: false,
            reject_message: None,
        }
    }
}

// =============================================================================
// Brokered commands (engine -> gateway)
// =============================================================================

/// Outbound order from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokeredOrder {
    /// Client-assigned order id
    pub order_id: String,
    /// Side of the book
    pub side: Side,
    /// Order type
    pub order_type: OrderType,
    /// Limit price (market orders carry the engine's reference price)
    pub price: Decimal,
    /// Order quantity
    pub quantity: Decimal,
}

/// Outbound cancel from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokeredCancel {
    /// Client id of the order being cancelled
    pub orig_order_id: String,
    /// Client id assigned to the cancel request itself
    pub order_id: String,
    /// Side of the original order
    pub side: Side,
    /// Exchange-assigned id of the order being cancelled
    pub exchange_id: Option<String>,
}

/// Outbound cancel-replace from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokeredReplace {
    /// Client id assigned to the replacement order
    pub order_id: String,
    /// Client id of the order being replaced
    pub orig_order_id: String,
    /// Exchange-assigned id of the order being replaced
    pub exchange_id: Option<String>,
    /// Side of the book
    pub side: Side,
    /// Order type
    pub order_type: OrderType,
    /// New limit price
    pub price: Decimal,
    /// New quantity
    pub quantity: Decimal,
}

/// Immediate acknowledgement that a gateway accepted a request for
/// submission. Exchange acceptance arrives later as a status report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderGatewayActionReport {
    /// When the gateway accepted the request
    pub sent_time: DateTime<Utc>,
}

impl OrderGatewayActionReport {
    /// Record a submission acknowledgement at the given time.
    pub fn new(sent_time: DateTime<Utc>) -> Self {
        Self { sent_time }
    }
}

// =============================================================================
// Tests
// =============================================================================
