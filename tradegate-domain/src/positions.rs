//! Canonical position model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::Currency;

/// Balance held in one currency.
///
/// One instance per currency per polling tick; a newer instance for the same
/// currency supersedes the previous one, it is never merged into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyPosition {
    /// The currency this balance is denominated in
    pub currency: Currency,
    /// Freely available amount
    pub available: Decimal,
    /// Amount held against open orders
    pub held: Decimal,
}

impl CurrencyPosition {
    /// Create a position snapshot.
    pub fn new(currency: Currency, available: Decimal, held: Decimal) -> Self {
        Self {
            currency,
            available,
            held,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_position_round_trip() {
        let pos = CurrencyPosition::new(Currency::BTC, dec!(1.5), dec!(0.25));

        let json = serde_json::to_string(&pos).unwrap();
        let parsed: CurrencyPosition = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, pos);
        assert_eq!(parsed.available, dec!(1.5));
        assert_eq!(parsed.held, dec!(0.25));
    }
}
