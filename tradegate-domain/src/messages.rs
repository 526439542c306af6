//! Canonical event stream surface for downstream consumers.
//!
//! Downstream consumers (e.g. an order dashboard) receive order status
//! reports over these topics and may send back two commands: cancel an order,
//! or cancel-replace it with a new price/quantity. Consumers never talk to
//! the exchange directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::orders::OrderStatusReport;
use crate::value_objects::CurrencyPair;

/// Topic names on the consumer event stream.
pub mod topics {
    /// A single order status report
    pub const ORDER_STATUS_REPORT: &str = "order-status-report";
    /// Array of latest reports, sent after a consumer (re)connects
    pub const ORDER_STATUS_SNAPSHOT: &str = "order-status-report-snapshot";
    /// Inbound: cancel an existing order
    pub const CANCEL_ORDER: &str = "cancel-order";
    /// Inbound: cancel-replace an existing order
    pub const CANCEL_REPLACE: &str = "cancel-replace";
}

/// A status report tagged with the trading pair it originated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    /// Trading pair the order belongs to
    pub pair: CurrencyPair,
    /// The report itself
    pub report: OrderStatusReport,
}

/// Replacement terms attached to a cancel-replace command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplaceRequest {
    /// New limit price
    pub price: Decimal,
    /// New quantity
    pub quantity: Decimal,
}

/// Commands accepted from downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsumerCommand {
    /// Cancel the order described by this report
    CancelOrder(OrderStatusReport),
    /// Cancel the order described by this report and send a replacement
    CancelReplace {
        /// Report identifying the order to replace
        report: OrderStatusReport,
        /// New price and quantity
        replace: ReplaceRequest,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus;
    use crate::value_objects::Currency;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_topic_names_are_stable() {
        // Consumers key on these names over the wire
        assert_eq!(topics::ORDER_STATUS_REPORT, "order-status-report");
        assert_eq!(topics::ORDER_STATUS_SNAPSHOT, "order-status-report-snapshot");
        assert_eq!(topics::CANCEL_ORDER, "cancel-order");
        assert_eq!(topics::CANCEL_REPLACE, "cancel-replace");
    }

    #[test]
    fn test_order_status_update_round_trip() {
        let update = OrderStatusUpdate {
            pair: CurrencyPair::new(Currency::BTC, Currency::USD),
            report: OrderStatusReport::new(OrderStatus::Working, Utc::now()),
        };

        let json = serde_json::to_string(&update).unwrap();
        let parsed: OrderStatusUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, update);
    }

    #[test]
    fn test_cancel_replace_command_round_trip() {
        let cmd = ConsumerCommand::CancelReplace {
            report: OrderStatusReport::new(OrderStatus::Working, Utc::now()),
            replace: ReplaceRequest {
                price: dec!(101),
                quantity: dec!(2),
            },
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let parsed: ConsumerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
    }
}
