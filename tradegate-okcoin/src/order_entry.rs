//! OKCoin order entry adapter.
//!
//! Commands go out as signed REST calls; acceptance comes back two ways that
//! must be treated as independently valid updates: the REST acknowledgement,
//! and asynchronous execution-report frames on the `ExecRpt` channel. Each
//! command returns an immediate submission acknowledgement; the exchange's
//! answer arrives later as a canonical status report on the order update
//! stream. A failed send surfaces as a Rejected report, never as an error
//! escaping the adapter boundary.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

use tradegate_domain::{
    BrokeredCancel, BrokeredOrder, BrokeredReplace, ConnectivityStatus,
    OrderGatewayActionReport, OrderStatus, OrderStatusReport, OrderType, Side, Timestamped,
};
use tradegate_gateway::{GatewayError, GatewayResult, OrderEntryGateway};

use crate::rest::OkCoinRestClient;
use crate::socket::OkCoinSocket;

/// Execution report channel name.
pub const EXEC_REPORT_CHANNEL: &str = "ExecRpt";

/// REST action for new orders.
const TRADE_ACTION: &str = "trade.do";

/// REST action for cancels.
const CANCEL_ACTION: &str = "cancel_order.do";

/// Trading pair symbol in the exchange's vocabulary.
const ORDER_SYMBOL: &str = "btc_usd";

/// Length of generated client order ids.
const CLIENT_ORDER_ID_LEN: usize = 8;

// =============================================================================
// Wire shapes
// =============================================================================

/// REST acknowledgement for trade and cancel actions.
#[derive(Debug, Deserialize)]
struct OrderAck {
    result: bool,
    #[serde(default)]
    order_id: Option<i64>,
}

/// Execution report frame payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkCoinExecReport {
    exchange_id: Option<String>,
    order_id: Option<String>,
    order_status: String,
    reject_message: Option<String>,
    last_quantity: Option<Decimal>,
    last_price: Option<Decimal>,
    leaves_quantity: Option<Decimal>,
    cum_quantity: Option<Decimal>,
    average_price: Option<Decimal>,
}

// =============================================================================
// Translation
// =============================================================================

/// Map the canonical side/type pair to the exchange's order-type vocabulary.
///
/// # Errors
/// `Configuration` naming the pair when it has no representation on this
/// exchange.
fn exchange_order_type(side: Side, order_type: OrderType) -> GatewayResult<&'static str> {
    match (side, order_type) {
        (Side::Bid, OrderType::Limit) => Ok("buy"),
        (Side::Bid, OrderType::Market) => Ok("buy_market"),
        (Side::Ask, OrderType::Limit) => Ok("sell"),
        (Side::Ask, OrderType::Market) => Ok("sell_market"),
        (side, order_type) => Err(GatewayError::Configuration(format!(
            "unable to convert {} {} to an exchange order type",
            side, order_type
        ))),
    }
}

/// Map an exchange status code to the canonical primary status.
fn status_from_code(code: &str) -> OrderStatus {
    match code {
        // "6" is cancel in flight, "E" is replace in flight; both stay
        // Working with the matching pending flag set
        "0" | "1" | "6" | "E" => OrderStatus::Working,
        "2" => OrderStatus::Complete,
        "4" => OrderStatus::Cancelled,
        "8" => OrderStatus::Rejected,
        _ => OrderStatus::Other,
    }
}

/// Keep a numeric field only when the source carried a meaningful value.
fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

/// Translate one execution report frame into a canonical status report.
fn report_from_exec(frame: &Timestamped<Value>) -> GatewayResult<OrderStatusReport> {
    let msg: OkCoinExecReport = serde_json::from_value(frame.data.clone())
        .map_err(|e| GatewayError::Protocol(format!("undecodable execution report: {}", e)))?;

    let status = status_from_code(&msg.order_status);
    let mut report = OrderStatusReport::new(status, frame.time);
    report.exchange_id = msg.exchange_id;
    report.order_id = msg.order_id;
    report.last_quantity = positive(msg.last_quantity);
    report.last_price = positive(msg.last_price);
    report.leaves_quantity = if status == OrderStatus::Working {
        positive(msg.leaves_quantity)
    } else {
        None
    };
    report.cum_quantity = positive(msg.cum_quantity);
    report.average_price = positive(msg.average_price);
    report.pending_cancel = msg.order_status == "6";
    report.pending_replace = msg.order_status == "E";
    // Derived from the quantity fields, not from a status code
    report.partially_filled = report.cum_quantity.is_some() && report.leaves_quantity.is_some();
    report.reject_message = msg.reject_message.filter(|m| !m.is_empty());

    Ok(report)
}

/// Translate the trade.do acknowledgement: Working with the exchange id on
/// success, Rejected otherwise.
fn report_from_trade_ack(ack: &Timestamped<Value>) -> OrderStatusReport {
    match serde_json::from_value::<OrderAck>(ack.data.clone()) {
        Ok(OrderAck {
            result: true,
            order_id: Some(exchange_id),
        }) => {
            let mut report = OrderStatusReport::new(OrderStatus::Working, ack.time);
            report.exchange_id = Some(exchange_id.to_string());
            report
        }
        Ok(_) => OrderStatusReport::new(OrderStatus::Rejected, ack.time),
        Err(e) => {
            warn!(error = %e, body = %ack.data, "undecodable order acknowledgement");
            OrderStatusReport::new(OrderStatus::Rejected, ack.time)
        }
    }
}

/// Translate the cancel_order.do acknowledgement: Cancelled on success,
/// Rejected with the cancel_rejected flag otherwise.
fn report_from_cancel_ack(ack: &Timestamped<Value>) -> OrderStatusReport {
    match serde_json::from_value::<OrderAck>(ack.data.clone()) {
        Ok(OrderAck { result: true, .. }) => {
            OrderStatusReport::new(OrderStatus::Cancelled, ack.time)
        }
        Ok(_) => {
            let mut report = OrderStatusReport::new(OrderStatus::Rejected, ack.time);
            report.cancel_rejected = true;
            report
        }
        Err(e) => {
            warn!(error = %e, body = %ack.data, "undecodable cancel acknowledgement");
            let mut report = OrderStatusReport::new(OrderStatus::Rejected, ack.time);
            report.cancel_rejected = true;
            report
        }
    }
}

/// Build the ExecRpt channel handler feeding a broadcast sender.
fn exec_report_handler(
    order_tx: broadcast::Sender<OrderStatusReport>,
) -> impl FnMut(Timestamped<Value>) + Send {
    move |frame| match report_from_exec(&frame) {
        Ok(report) => {
            let _ = order_tx.send(report);
        }
        Err(e) => {
            warn!(error = %e, "dropping undecodable execution report");
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Order entry capability over signed REST plus the ExecRpt channel.
pub struct OkCoinOrderEntryGateway {
    http: Arc<OkCoinRestClient>,
    symbol: String,
    order_tx: broadcast::Sender<OrderStatusReport>,
    status_tx: broadcast::Sender<ConnectivityStatus>,
}

impl OkCoinOrderEntryGateway {
    /// Create the adapter, subscribe the execution report channel, and start
    /// the connectivity fan-out.
    ///
    /// ExecRpt is subscribed once for the process lifetime; the handler map
    /// registration survives reconnects even though the exchange-side
    /// subscription does not.
    pub fn new(socket: Arc<OkCoinSocket>, http: Arc<OkCoinRestClient>) -> Arc<Self> {
        let (order_tx, _) = broadcast::channel(1024);
        let (status_tx, _) = broadcast::channel(16);

        let gateway = Arc::new(Self {
            http,
            symbol: ORDER_SYMBOL.to_string(),
            order_tx,
            status_tx,
        });

        socket.subscribe(
            EXEC_REPORT_CHANNEL,
            exec_report_handler(gateway.order_tx.clone()),
        );

        let this = gateway.clone();
        let mut socket_status = socket.connectivity();
        tokio::spawn(async move {
            loop {
                match socket_status.recv().await {
                    Ok(status) => {
                        let _ = this.status_tx.send(status);
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "connectivity receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        gateway
    }

    fn emit(order_tx: &broadcast::Sender<OrderStatusReport>, report: OrderStatusReport) {
        let _ = order_tx.send(report);
    }
}

#[async_trait]
impl OrderEntryGateway for OkCoinOrderEntryGateway {
    async fn send_order(&self, order: &BrokeredOrder) -> GatewayResult<OrderGatewayActionReport> {
        // Unsupported side/type pairs fail synchronously, before anything
        // reaches the wire
        let order_type = exchange_order_type(order.side, order.order_type)?;

        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), self.symbol.clone());
        params.insert("type".to_string(), order_type.to_string());
        params.insert("price".to_string(), order.price.to_string());
        params.insert("amount".to_string(), order.quantity.to_string());

        let http = self.http.clone();
        let order_tx = self.order_tx.clone();
        let client_id = order.order_id.clone();
        let side = order.side;
        let canonical_type = order.order_type;
        tokio::spawn(async move {
            let mut report = match http.post(TRADE_ACTION, params).await {
                Ok(ack) => report_from_trade_ack(&ack),
                Err(e) => {
                    warn!(error = %e, "order submission failed");
                    OrderStatusReport::new(OrderStatus::Rejected, Utc::now())
                }
            };
            report.order_id = Some(client_id);
            report.side = side;
            report.order_type = Some(canonical_type);
            Self::emit(&order_tx, report);
        });

        Ok(OrderGatewayActionReport::new(Utc::now()))
    }

    async fn cancel_order(
        &self,
        cancel: &BrokeredCancel,
    ) -> GatewayResult<OrderGatewayActionReport> {
        let client_id = cancel.orig_order_id.clone();

        let Some(exchange_id) = cancel.exchange_id.clone() else {
            // Nothing to address the cancel to; refuse it locally
            warn!(order_id = %client_id, "cancel without an exchange id");
            let mut report = OrderStatusReport::new(OrderStatus::Rejected, Utc::now());
            report.order_id = Some(client_id);
            report.cancel_rejected = true;
            Self::emit(&self.order_tx, report);
            return Ok(OrderGatewayActionReport::new(Utc::now()));
        };

        let mut params = BTreeMap::new();
        params.insert("orderId".to_string(), exchange_id.clone());

        let http = self.http.clone();
        let order_tx = self.order_tx.clone();
        let side = cancel.side;
        tokio::spawn(async move {
            let mut report = match http.post(CANCEL_ACTION, params).await {
                Ok(ack) => report_from_cancel_ack(&ack),
                Err(e) => {
                    warn!(error = %e, "cancel submission failed");
                    let mut report = OrderStatusReport::new(OrderStatus::Rejected, Utc::now());
                    report.cancel_rejected = true;
                    report
                }
            };
            report.order_id = Some(client_id);
            report.exchange_id = Some(exchange_id);
            report.side = side;
            Self::emit(&order_tx, report);
        });

        Ok(OrderGatewayActionReport::new(Utc::now()))
    }

    async fn replace_order(
        &self,
        replace: &BrokeredReplace,
    ) -> GatewayResult<OrderGatewayActionReport> {
        // Cancel then send, deliberately not atomic: each leg produces its
        // own status event and the caller reconciles. The send is attempted
        // even when the cancel ends up rejected.
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
        const ALPHABET: &[u8] =
            b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut rng = rand::thread_rng();
        (0..CLIENT_ORDER_ID_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    fn cancels_by_client_order_id(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
