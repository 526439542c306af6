//! Canonical order event hub for downstream consumers.
//!
//! Sits between the order gateway and display-only consumers (e.g. an order
//! dashboard): republishes every status report tagged with its trading pair,
//! keeps the latest report per order so a (re)connecting consumer can be
//! served a snapshot, and translates the two inbound consumer commands
//! (cancel, cancel-replace) into brokered calls on the order gateway.
//! Consumers never talk to the exchange directly.
//!
//! Successive reports for one order can each carry only part of the picture
//! (an execution report does not repeat the side the order was sent with), so
//! the hub carries identity fields forward from the previous report when a
//! new one leaves them unset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use tradegate_domain::messages::topics;
use tradegate_domain::{
    BrokeredCancel, BrokeredReplace, ConsumerCommand, CurrencyPair, OrderGatewayActionReport,
    OrderStatusReport, OrderStatusUpdate, OrderType, ReplaceRequest, Side,
};
use tradegate_gateway::OrderEntryGateway;

use crate::error::{DaemonError, DaemonResult};

/// Order event hub.
pub struct OrderEventHub {
    pair: CurrencyPair,
    order_entry: Arc<dyn OrderEntryGateway>,
    update_tx: broadcast::Sender<OrderStatusUpdate>,
    latest: Mutex<HashMap<String, OrderStatusReport>>,
}

impl OrderEventHub {
    /// Create the hub and start republishing the gateway's order updates.
    pub fn new(pair: CurrencyPair, order_entry: Arc<dyn OrderEntryGateway>) -> Arc<Self> {
        let (update_tx, _) = broadcast::channel(1024);

        let hub = Arc::new(Self {
            pair,
            order_entry: order_entry.clone(),
            update_tx,
            latest: Mutex::new(HashMap::new()),
        });

        let this = hub.clone();
        let mut updates = order_entry.order_updates();
        tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(report) => this.ingest(report),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "order update receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        hub
    }

    /// Subscribe to pair-tagged order status events.
    pub fn updates(&self) -> broadcast::Receiver<OrderStatusUpdate> {
        self.update_tx.subscribe()
    }

    /// Latest report per order, for a consumer that just (re)connected.
    pub fn snapshot(&self) -> Vec<OrderStatusUpdate> {
        let snapshot: Vec<OrderStatusUpdate> = self
            .latest
            .lock()
            .unwrap()
            .values()
            .map(|report| OrderStatusUpdate {
                pair: self.pair,
                report: report.clone(),
            })
            .collect();

        debug!(
            topic = topics::ORDER_STATUS_SNAPSHOT,
            orders = snapshot.len(),
            "serving snapshot"
        );
        snapshot
    }

    /// Execute a consumer command against the order gateway.
    ///
    /// # Errors
    /// `InvalidCommand` when the report carries no client order id;
    /// gateway errors pass through.
    pub async fn handle_command(
        &self,
        command: ConsumerCommand,
    ) -> DaemonResult<OrderGatewayActionReport> {
        match command {
            ConsumerCommand::CancelOrder(report) => {
                let report = self.resolve(report)?;
                debug!(
                    topic = topics::CANCEL_ORDER,
                    order_id = ?report.order_id,
                    "consumer cancel"
                );

                let cancel = BrokeredCancel {
                    orig_order_id: report.order_id.clone().unwrap_or_default(),
                    order_id: self.order_entry.generate_client_order_id(),
                    side: report.side,
                    exchange_id: report.exchange_id.clone(),
                };
                Ok(self.order_entry.cancel_order(&cancel).await?)
            }
            ConsumerCommand::CancelReplace { report, replace } => {
                let report = self.resolve(report)?;
                debug!(
                    topic = topics::CANCEL_REPLACE,
                    order_id = ?report.order_id,
                    "consumer cancel-replace"
                );

                let replace = self.brokered_replace(&report, replace);
                Ok(self.order_entry.replace_order(&replace).await?)
            }
        }
    }

    /// Fill in identity fields the consumer's copy of the report may lack
    /// from the latest report the hub holds for that order.
    fn resolve(&self, mut report: OrderStatusReport) -> DaemonResult<OrderStatusReport> {
        let Some(order_id) = report.order_id.clone() else {
            return Err(DaemonError::InvalidCommand(
                "report carries no client order id".to_string(),
            ));
        };

        if let Some(known) = self.latest.lock().unwrap().get(&order_id) {
            if report.side == Side::Unknown {
                report.side = known.side;
            }
            if report.order_type.is_none() {
                report.order_type = known.order_type;
            }
            if report.exchange_id.is_none() {
                report.exchange_id = known.exchange_id.clone();
            }
        }

        Ok(report)
    }

    fn brokered_replace(&self, report: &OrderStatusReport, terms: ReplaceRequest) -> BrokeredReplace {
        BrokeredReplace {
            order_id: self.order_entry.generate_client_order_id(),
            orig_order_id: report.order_id.clone().unwrap_or_default(),
            exchange_id: report.exchange_id.clone(),
            side: report.side,
            order_type: report.order_type.unwrap_or(OrderType::Limit),
            price: terms.price,
            quantity: terms.quantity,
        }
    }

    /// Merge one gateway report into the latest-per-order map and republish.
    fn ingest(&self, mut report: OrderStatusReport) {
        if let Some(order_id) = report.order_id.clone() {
            let mut latest = self.latest.lock().unwrap();
            if let Some(previous) = latest.get(&order_id) {
                if report.side == Side::Unknown {
                    report.side = previous.side;
                }
                if report.order_type.is_none() {
                    report.order_type = previous.order_type;
                }
                if report.exchange_id.is_none() {
                    report.exchange_id = previous.exchange_id.clone();
                }
            }
            latest.insert(order_id, report.clone());
        } else {
            warn!("order update without a client order id, not tracked in snapshot");
        }

        debug!(
            topic = topics::ORDER_STATUS_REPORT,
            order_id = ?report.order_id,
            status = %report.status,
            "republishing order update"
        );
        let _ = self.update_tx.send(OrderStatusUpdate {
            pair: self.pair,
            report,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradegate_domain::{BrokeredOrder, Currency, OrderStatus};
    use tradegate_gateway::NullOrderGateway;

    fn pair() -> CurrencyPair {
        CurrencyPair::new(Currency::BTC, Currency::USD)
    }

    fn limit_buy() -> BrokeredOrder {
        BrokeredOrder {
            order_id: "c1".to_string(),
            side: Side::Bid,
            order_type: OrderType::Limit,
            price: dec!(100),
            quantity: dec!(1),
        }
    }

    #[tokio::test]
    async fn test_updates_are_tagged_with_the_pair() {
        let gateway = NullOrderGateway::new();
        let hub = OrderEventHub::new(pair(), gateway.clone());
        let mut updates = hub.updates();

        gateway.send_order(&limit_buy()).await.unwrap();

        let update = updates.recv().await.unwrap();
        assert_eq!(update.pair, pair());
        assert_eq!(update.report.order_id.as_deref(), Some("c1"));
        assert_eq!(update.report.status, OrderStatus::Working);
    }

    #[tokio::test]
    async fn test_snapshot_holds_the_latest_report_per_order() {
        let gateway = NullOrderGateway::new();
        let hub = OrderEventHub::new(pair(), gateway.clone());
        let mut updates = hub.updates();

        gateway.send_order(&limit_buy()).await.unwrap();
        updates.recv().await.unwrap();

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].report.status, OrderStatus::Working);

        // A later report for the same order supersedes, it is not appended
        let working = snapshot[0].report.clone();
        hub.handle_command(ConsumerCommand::CancelOrder(working))
            .await
            .unwrap();
        updates.recv().await.unwrap();

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].report.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_replace_produces_two_events() {
        let gateway = NullOrderGateway::new();
        let hub = OrderEventHub::new(pair(), gateway.clone());
        let mut updates = hub.updates();

        gateway.send_order(&limit_buy()).await.unwrap();
        let working = updates.recv().await.unwrap().report;

        hub.handle_command(ConsumerCommand::CancelReplace {
            report: working,
            replace: ReplaceRequest {
                price: dec!(99),
                quantity: dec!(2),
            },
        })
        .await
        .unwrap();

        let first = updates.recv().await.unwrap().report;
        let second = updates.recv().await.unwrap().report;
        assert_eq!(first.status, OrderStatus::Cancelled);
        assert_eq!(second.status, OrderStatus::Working);
        // The replacement is a new order under a fresh client id
        assert_ne!(second.order_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_identity_fields_carry_forward_to_commands() {
        let gateway = NullOrderGateway::new();
        let hub = OrderEventHub::new(pair(), gateway.clone());
        let mut updates = hub.updates();

        gateway.send_order(&limit_buy()).await.unwrap();
        updates.recv().await.unwrap();

        // Consumer sends back a bare report: only the client id survives the
        // display layer
        let mut bare = OrderStatusReport::new(OrderStatus::Working, chrono::Utc::now());
        bare.order_id = Some("c1".to_string());

        let resolved = hub.resolve(bare).unwrap();
        assert_eq!(resolved.side, Side::Bid);
        assert_eq!(resolved.order_type, Some(OrderType::Limit));
        assert!(resolved.exchange_id.is_some());
    }

    #[tokio::test]
    async fn test_command_without_order_id_is_invalid() {
        let gateway = NullOrderGateway::new();
        let hub = OrderEventHub::new(pair(), gateway);

        let report = OrderStatusReport::new(OrderStatus::Working, chrono::Utc::now());
        let err = hub
            .handle_command(ConsumerCommand::CancelOrder(report))
            .await
            .unwrap_err();

        assert!(matches!(err, DaemonError::InvalidCommand(_)));
    }
}
