//! Tradegate Gateway Contract
//!
//! The uniform, exchange-agnostic gateway contract: port traits for market
//! data, order entry, positions, and exchange metadata, plus the combined
//! gateway that binds one implementation of each together.
//!
//! Exchange implementations (e.g. `tradegate-okcoin`) adapt their wire
//! protocols to these ports; the engine and any downstream consumers only
//! ever see this contract.

pub mod error;
pub mod null;
pub mod ports;

pub use error::{GatewayError, GatewayResult};
pub use null::NullOrderGateway;
pub use ports::{
    CombinedGateway, ExchangeDetails, MarketDataGateway, OrderEntryGateway, PositionGateway,
};
