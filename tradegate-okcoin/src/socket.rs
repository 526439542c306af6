//! OKCoin multiplexed socket client.
//!
//! Owns one persistent WebSocket connection and multiplexes named channels
//! over it: `subscribe` registers a per-channel handler (at most one per
//! channel, latest registration wins) and sends the exchange's `addChannel`
//! request; inbound frames are dispatched to the registered handler with the
//! arrival timestamp recorded before parsing.
//!
//! Outbound writes (subscriptions, heartbeat replies) flow through a queue
//! drained by the single read/write loop, so there is no parallel mutation of
//! the connection. Connectivity transitions fan out on a broadcast stream.
//! Handlers are never deregistered; closing the socket only changes
//! connectivity status.

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WebSocketMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{info, warn};

use tradegate_domain::{ConnectivityStatus, Timestamped};
use tradegate_gateway::{GatewayError, GatewayResult};

/// Type alias for the WebSocket stream (with auto TLS).
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handler for one channel's timestamped payloads.
pub type ChannelHandler = Box<dyn FnMut(Timestamped<Value>) + Send>;

/// Heartbeat token the exchange sends.
const HEARTBEAT_EVENT: &str = "ping";

/// Fixed heartbeat acknowledgement frame.
const HEARTBEAT_REPLY: &str = r#"{"event":"pong"}"#;

/// Delay between reconnect attempts (in seconds).
const RECONNECT_DELAY_SECS: u64 = 5;

/// Logical payload inside the exchange's one-element array wrapper.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    channel: Option<String>,
    success: Option<String>,
    data: Option<Value>,
    event: Option<String>,
}

/// Multiplexed socket client.
pub struct OkCoinSocket {
    ws_url: String,
    partner: String,
    secret_key: String,
    handlers: Mutex<HashMap<String, ChannelHandler>>,
    outbound_tx: mpsc::UnboundedSender<WebSocketMessage>,
    outbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<WebSocketMessage>>,
    status_tx: broadcast::Sender<ConnectivityStatus>,
}

impl OkCoinSocket {
    /// Create a socket client. The connection is not opened until [`run`]
    /// is spawned.
    ///
    /// [`run`]: OkCoinSocket::run
    pub fn new(ws_url: String, partner: String, secret_key: String) -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = broadcast::channel(16);

        Arc::new(Self {
            ws_url,
            partner,
            secret_key,
            handlers: Mutex::new(HashMap::new()),
            outbound_tx,
            outbound_rx: tokio::sync::Mutex::new(outbound_rx),
            status_tx,
        })
    }

    /// Subscribe to connectivity transitions.
    pub fn connectivity(&self) -> broadcast::Receiver<ConnectivityStatus> {
        self.status_tx.subscribe()
    }

    /// Register a handler for a channel and request the subscription.
    ///
    /// The most recent registration for a channel wins; handlers live until
    /// process shutdown. No automatic re-subscription happens on reconnect --
    /// each adapter decides from its own Connected-transition handler whether
    /// re-subscribing is meaningful after a gap.
    pub fn subscribe<F>(&self, channel: &str, handler: F)
    where
        F: FnMut(Timestamped<Value>) + Send + 'static,
    {
        let request = serde_json::json!({
            "event": "addChannel",
            "channel": channel,
            "parameters": {
                "partner": self.partner,
                "secretkey": self.secret_key,
            },
        });

        self.handlers
            .lock()
            .unwrap()
            .insert(channel.to_string(), Box::new(handler));

        // Queued until the write loop drains it; lost sends only happen at
        // process shutdown
        let _ = self
            .outbound_tx
            .send(WebSocketMessage::Text(request.to_string()));
    }

    /// Connection lifecycle loop: connect, drive one session, reconnect.
    ///
    /// Runs until the process shuts down. Each session emits Connected on
    /// open and Disconnected when the read cycle ends, then waits a fixed
    /// delay before reconnecting.
    pub async fn run(self: Arc<Self>) {
        loop {
            match connect_async(&self.ws_url).await {
                Ok((stream, _)) => {
                    info!(url = %self.ws_url, "exchange socket connected");
                    let _ = self.status_tx.send(ConnectivityStatus::Connected);

                    if let Err(e) = self.drive(stream).await {
                        warn!(error = %e, "socket session ended");
                    }

                    let _ = self.status_tx.send(ConnectivityStatus::Disconnected);
                }
                Err(e) => {
                    warn!(url = %self.ws_url, error = %e, "socket connect failed");
                }
            }

            tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
        }
    }

    /// Drive one connected session: drain the outbound queue and dispatch
    /// inbound frames until the stream ends or a frame is malformed.
    async fn drive(&self, stream: WsStream) -> GatewayResult<()> {
        let (mut sink, mut source) = stream.split();
        let mut outbound = self.outbound_rx.lock().await;

        loop {
            tokio::select! {
                Some(frame) = outbound.recv() => {
                    sink.send(frame)
                        .await
                        .map_err(|e| GatewayError::Transport(e.to_string()))?;
                }
                inbound = source.next() => match inbound {
                    Some(Ok(WebSocketMessage::Text(text))) => {
                        // A malformed frame escalates here and tears the
                        // session down; the run loop reconnects
                        if let Some(reply) = self.handle_frame(&text, Utc::now())? {
                            sink.send(WebSocketMessage::Text(reply))
                                .await
                                .map_err(|e| GatewayError::Transport(e.to_string()))?;
                        }
                    }
                    Some(Ok(WebSocketMessage::Ping(payload))) => {
                        sink.send(WebSocketMessage::Pong(payload))
                            .await
                            .map_err(|e| GatewayError::Transport(e.to_string()))?;
                    }
                    Some(Ok(WebSocketMessage::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(GatewayError::Transport(e.to_string())),
                }
            }
        }
    }

    /// Handle one inbound text frame, returning the reply to send, if any.
    ///
    /// Dispatch order: heartbeat first (so heartbeats are never starved under
    /// load), then subscription acknowledgements, then channel routing.
    /// Unknown channels are logged and dropped, never escalated -- forward
    /// compatibility with exchange protocol additions.
    pub(crate) fn handle_frame(
        &self,
        raw: &str,
        arrival: DateTime<Utc>,
    ) -> GatewayResult<Option<String>> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            warn!(raw, error = %e, "malformed frame");
            GatewayError::Protocol(format!("malformed frame: {}", e))
        })?;

        // The exchange wraps the logical payload in a one-element array
        let payload = value
            .as_array()
            .and_then(|wrapper| wrapper.first())
            .cloned()
            .ok_or_else(|| {
                warn!(raw, "frame is not an array-wrapped payload");
                GatewayError::Protocol("frame is not an array-wrapped payload".to_string())
            })?;

        let frame: InboundFrame = serde_json::from_value(payload).map_err(|e| {
            warn!(raw, error = %e, "undecodable frame");
            GatewayError::Protocol(format!("undecodable frame: {}", e))
        })?;

        if frame.event.as_deref() == Some(HEARTBEAT_EVENT) {
            return Ok(Some(HEARTBEAT_REPLY.to_string()));
        }

        if let Some(success) = frame.success {
            let channel = frame.channel.as_deref().unwrap_or("");
            if success == "true" {
                info!(channel, "channel subscription acknowledged");
            } else {
                warn!(channel, %success, "channel subscription refused");
            }
            return Ok(None);
        }

        let channel = frame.channel.unwrap_or_default();
        let mut handlers = self.handlers.lock().unwrap();
        match handlers.get_mut(&channel) {
            Some(handler) => {
                handler(Timestamped::new(frame.data.unwrap_or(Value::Null), arrival));
            }
            None => {
                warn!(%channel, "message on channel with no registered handler");
            }
        }

        Ok(None)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn socket() -> Arc<OkCoinSocket> {
        OkCoinSocket::new(
            "wss://example.invalid/ws".to_string(),
            "partner".to_string(),
            "secret".to_string(),
        )
    }

    fn recording_handler() -> (
        Arc<Mutex<Vec<Timestamped<Value>>>>,
        impl FnMut(Timestamped<Value>) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |msg| sink.lock().unwrap().push(msg))
    }

    #[test]
    fn test_heartbeat_gets_exactly_the_fixed_pong() {
        let socket = socket();
        let (seen, handler) = recording_handler();
        socket.subscribe("ok_btcusd_depth", handler);

        let reply = socket
            .handle_frame(r#"[{"event":"ping"}]"#, Utc::now())
            .unwrap();

        assert_eq!(reply.as_deref(), Some(r#"{"event":"pong"}"#));
        // No other dispatch happened for that frame
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscription_ack_is_not_routed() {
        let socket = socket();
        let (seen, handler) = recording_handler();
        socket.subscribe("ok_btcusd_depth", handler);

        let reply = socket
            .handle_frame(
                r#"[{"channel":"ok_btcusd_depth","success":"true"}]"#,
                Utc::now(),
            )
            .unwrap();

        assert!(reply.is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_routed_frame_carries_data_and_arrival_time() {
        let socket = socket();
        let (seen, handler) = recording_handler();
        socket.subscribe("ok_btcusd_depth", handler);

        let arrival = Utc::now();
        socket
            .handle_frame(
                r#"[{"channel":"ok_btcusd_depth","data":{"bids":[[100,2]]}}]"#,
                arrival,
            )
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].time, arrival);
        assert_eq!(seen[0].data["bids"][0][0], 100);
    }

    #[test]
    fn test_unknown_channel_is_dropped_without_error() {
        let socket = socket();

        let reply = socket
            .handle_frame(r#"[{"channel":"mystery","data":{}}]"#, Utc::now())
            .unwrap();

        assert!(reply.is_none());
    }

    #[test]
    fn test_malformed_frame_escalates_as_protocol_error() {
        let socket = socket();

        let err = socket.handle_frame("not json", Utc::now()).unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));

        let err = socket
            .handle_frame(r#"{"channel":"x"}"#, Utc::now())
            .unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }

    #[test]
    fn test_latest_handler_registration_wins() {
        let socket = socket();
        let (first_seen, first) = recording_handler();
        let (second_seen, second) = recording_handler();

        socket.subscribe("ok_btcusd_depth", first);
        socket.subscribe("ok_btcusd_depth", second);

        socket
            .handle_frame(r#"[{"channel":"ok_btcusd_depth","data":{}}]"#, Utc::now())
            .unwrap();

        assert!(first_seen.lock().unwrap().is_empty());
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }
}
