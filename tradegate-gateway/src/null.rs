//! No-op order entry gateway.
//!
//! Used by a composer when its exchange is not the configured order
//! destination: commands are accepted and acknowledged locally so the rest of
//! the system keeps a coherent order picture, but nothing reaches the wire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use tradegate_domain::{
    BrokeredCancel, BrokeredOrder, BrokeredReplace, ConnectivityStatus,
    OrderGatewayActionReport, OrderStatus, OrderStatusReport,
};

use crate::error::GatewayResult;
use crate::ports::OrderEntryGateway;

/// Delay before the null gateway reports itself connected.
const CONNECT_DELAY_MS: u64 = 500;

/// Order entry gateway that routes nothing to any exchange.
pub struct NullOrderGateway {
    order_tx: broadcast::Sender<OrderStatusReport>,
    status_tx: broadcast::Sender<ConnectivityStatus>,
    id_counter: AtomicU64,
}

impl NullOrderGateway {
    /// Create a null gateway. Reports Connected shortly after construction.
    pub fn new() -> Arc<Self> {
        let (order_tx, _) = broadcast::channel(256);
        let (status_tx, _) = broadcast::channel(16);

        let gateway = Arc::new(Self {
            order_tx,
            status_tx,
            id_counter: AtomicU64::new(0),
        });

        let status_tx = gateway.status_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(CONNECT_DELAY_MS)).await;
            let _ = status_tx.send(ConnectivityStatus::Connected);
        });

        gateway
    }

    fn emit(&self, report: OrderStatusReport) {
        // send() errs only when there are no receivers, which is fine
        let _ = self.order_tx.send(report);
    }
}

#[async_trait]
impl OrderEntryGateway for NullOrderGateway {
    async fn send_order(&self, order: &BrokeredOrder) -> GatewayResult<OrderGatewayActionReport> {
        debug!(order_id = %order.order_id, "null gateway accepting order");

        let mut report = OrderStatusReport::new(OrderStatus::Working, Utc::now());
        report.order_id = Some(order.order_id.clone());
        report.exchange_id = Some(format!("NULL-{}", self.id_counter.fetch_add(1, Ordering::Relaxed)));
        report.side = order.side;
        report.order_type = Some(order.order_type);
        report.leaves_quantity = Some(order.quantity);
        self.emit(report);

        Ok(OrderGatewayActionReport::new(Utc::now()))
    }

    async fn cancel_order(
        &self,
        cancel: &BrokeredCancel,
    ) -> GatewayResult<OrderGatewayActionReport> {
        debug!(order_id = %cancel.orig_order_id, "null gateway accepting cancel");

        let mut report = OrderStatusReport::new(OrderStatus::Cancelled, Utc::now());
        report.order_id = Some(cancel.orig_order_id.clone());
        report.exchange_id = cancel.exchange_id.clone();
        report.side = cancel.side;
        self.emit(report);

        Ok(OrderGatewayActionReport::new(Utc::now()))
    }

    async fn replace_order(
        &self,
        replace: &BrokeredReplace,
    ) -> GatewayResult<OrderGatewayActionReport> {
        let cancel = BrokeredCancel {
            orig_order_id: replace.orig_order_id.clone(),
            order_id: replace.order_id.clone(),
            side: replace.side,
            exchange_id: replace.exchange_id.clone(),
        };
        self.cancel_order(&cancel).await?;

        let order = BrokeredOrder {
            order_id: replace.order_id.clone(),
            side: replace.side,
            order_type: replace.order_type,
            price: replace.price,
            quantity: replace.quantity,
        };
        self.send_order(&order).await
    }

    fn order_updates(&self) -> broadcast::Receiver<OrderStatusReport> {
        self.order_tx.subscribe()
    }

    fn connectivity(&self) -> broadcast::Receiver<ConnectivityStatus> {
        self.status_tx.subscribe()
    }

    fn generate_client_order_id(&self) -> String {
        format!("null-{}", self.id_counter.fetch_add(1, Ordering::Relaxed))
    }

    fn cancels_by_client_order_id(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradegate_domain::{OrderType, Side};

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
    async fn test_send_order_emits_working_report() {
        let gateway = NullOrderGateway::new();
        let mut updates = gateway.order_updates();

        gateway.send_order(&limit_buy()).await.unwrap();

        let report = updates.recv().await.unwrap();
        assert_eq!(report.status, OrderStatus::Working);
        assert_eq!(report.order_id.as_deref(), Some("c1"));
        assert!(report.exchange_id.is_some());
        assert_eq!(report.leaves_quantity, Some(dec!(1)));
    }

    #[tokio::test]
    async fn test_replace_emits_two_independent_reports() {
        let gateway = NullOrderGateway::new();
        let mut updates = gateway.order_updates();

        let replace = BrokeredReplace {
            order_id: "c2".to_string(),
            orig_order_id: "c1".to_string(),
            exchange_id: Some("NULL-0".to_string()),
            side: Side::Bid,
            order_type: OrderType::Limit,
            price: dec!(99),
            quantity: dec!(2),
        };
        gateway.replace_order(&replace).await.unwrap();

        let first = updates.recv().await.unwrap();
        let second = updates.recv().await.unwrap();
        assert_eq!(first.status, OrderStatus::Cancelled);
        assert_eq!(second.status, OrderStatus::Working);
        assert_eq!(second.order_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_reports_connected_after_construction() {
        let gateway = NullOrderGateway::new();
        let mut status = gateway.connectivity();

        let cs = status.recv().await.unwrap();
        assert_eq!(cs, ConnectivityStatus::Connected);
    }

    #[tokio::test]
    async fn test_client_order_ids_differ() {
        let gateway = NullOrderGateway::new();
        let a = gateway.generate_client_order_id();
        let b = gateway.generate_client_order_id();
        assert_ne!(a, b);
    }
}
