//! Tradegate Daemon Library
//!
//! Runtime wiring for the exchange gateway: environment configuration, the
//! OKCoin gateway composition, and the order event hub serving downstream
//! consumers.
//!
//! # Components
//!
//! - **Config**: Environment-based configuration
//! - **OrderEventHub**: pair-tagged order events, snapshots, and consumer
//!   commands
//!
//! # Example
//!
//! ```rust,ignore
//! use tradegated::{Config, OrderEventHub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let gateway = tradegate_okcoin::create_gateway(config.okcoin_gateway_config());
//!     let hub = OrderEventHub::new(config.pair, gateway.order_entry.clone());
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod order_events;

// Re-exports for convenience
pub use config::{Config, OkCoinSettings};
pub use error::{DaemonError, DaemonResult};
pub use order_events::OrderEventHub;
