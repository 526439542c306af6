//! Tradegate Domain Layer
//!
//! Canonical, exchange-agnostic model shared by every gateway implementation.
//! Pure data types with zero I/O dependencies.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod market;
pub mod messages;
pub mod orders;
pub mod positions;
pub mod value_objects;

// Re-export commonly used types
pub use market::{Market, MarketSide};
pub use messages::{ConsumerCommand, OrderStatusUpdate, ReplaceRequest};
pub use orders::{
    BrokeredCancel, BrokeredOrder, BrokeredReplace, OrderGatewayActionReport, OrderStatus,
    OrderStatusReport, OrderType, Side,
};
pub use positions::CurrencyPosition;
pub use value_objects::{
    ConnectivityStatus, Currency, CurrencyPair, DomainError, Exchange, Timestamped,
};
