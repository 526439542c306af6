//! Canonical market depth model.
//!
//! A `Market` is a full snapshot of the order book as reported by the
//! exchange. Every depth frame produces a fresh snapshot; there is no
//! incremental diffing or coalescing at this layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// MarketSide
// =============================================================================

/// One price level on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSide {
    /// Level price
    pub price: Decimal,
    /// Size available at that price
    pub size: Decimal,
}

impl MarketSide {
    /// Create a price level.
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

// =============================================================================
// Market
// =============================================================================

/// Full order book snapshot.
///
/// Level ordering is whatever the exchange provided (best price first by
/// exchange convention); this layer never re-sorts or filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Bid levels, exchange order preserved
    pub bids: Vec<MarketSide>,
    /// Ask levels, exchange order preserved
    pub asks: Vec<MarketSide>,
    /// Capture time of the frame that produced this snapshot
    pub time: DateTime<Utc>,
}

impl Market {
    /// Create a snapshot from already-canonical levels.
    pub fn new(bids: Vec<MarketSide>, asks: Vec<MarketSide>, time: DateTime<Utc>) -> Self {
        Self { bids, asks, time }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_preserves_level_order() {
        let bids = vec![
            MarketSide::new(dec!(100), dec!(2)),
            MarketSide::new(dec!(99), dec!(5)),
        ];
        let asks = vec![
            MarketSide::new(dec!(101), dec!(3)),
            MarketSide::new(dec!(102), dec!(1)),
        ];
        let market = Market::new(bids.clone(), asks.clone(), Utc::now());

        assert_eq!(market.bids, bids);
        assert_eq!(market.asks, asks);
        assert_eq!(market.bids[0].price, dec!(100));
        assert_eq!(market.asks[0].price, dec!(101));
    }

    #[test]
    fn test_market_serialization_round_trip() {
        let market = Market::new(
            vec![MarketSide::new(dec!(95000.5), dec!(0.25))],
            vec![MarketSide::new(dec!(95001), dec!(0.5))],
            Utc::now(),
        );

        let json = serde_json::to_string(&market).unwrap();
        let parsed: Market = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, market);
    }
}
