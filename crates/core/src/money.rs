//! Money arithmetic on `rust_decimal::Decimal`.
//!
//! All monetary values are kept at two decimal places. Rounding happens at
//! well-defined points only: per line total and per VAT rate group.

use core::ops::{Add, AddAssign, Neg, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Number of decimal places for stored amounts.
pub const MONEY_DP: u32 = 2;

/// Round to two decimal places, midpoint away from zero (commercial rounding).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest quantity or unit price a line may carry.
pub const MAX_LINE_MAGNITUDE: i64 = 1_000_000_000_000;

/// Net total of a single line: `price × quantity`, rounded.
///
/// Inputs are expected within [`MAX_LINE_MAGNITUDE`]; see [`checked_line_total`]
/// for unvalidated values.
pub fn line_total(price: Decimal, quantity: Decimal) -> Decimal {
    round_money(price * quantity)
}

/// [`line_total`] that reports out-of-range inputs instead of overflowing.
pub fn checked_line_total(price: Decimal, quantity: Decimal) -> DomainResult<Decimal> {
    let limit = Decimal::from(MAX_LINE_MAGNITUDE);
    if price.abs() > limit || quantity.abs() > limit {
        return Err(DomainError::validation(format!(
            "quantity and price must be at most {limit} in magnitude"
        )));
    }
    price
        .checked_mul(quantity)
        .map(round_money)
        .ok_or_else(|| {
            DomainError::validation(format!("line total {price} × {quantity} overflows"))
        })
}

/// VAT rate applied to a line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VatRate {
    /// Percentage rate, e.g. `23` for 23%.
    Percent(Decimal),
    /// VAT-exempt ("zw").
    Exempt,
}

impl VatRate {
    pub fn percent(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() || value > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(format!(
                "vat rate must be within 0..=100, got {value}"
            )));
        }
        Ok(Self::Percent(value.normalize()))
    }

    /// Rate as a fraction (`0.23` for 23%).
    pub fn fraction(&self) -> Decimal {
        match self {
            VatRate::Percent(p) => *p / Decimal::ONE_HUNDRED,
            VatRate::Exempt => Decimal::ZERO,
        }
    }

    /// VAT due on a net amount, rounded.
    pub fn vat_on(&self, net: Decimal) -> Decimal {
        round_money(net * self.fraction())
    }

    /// Printable label (`"23%"`, `"zw"`).
    pub fn label(&self) -> String {
        match self {
            VatRate::Percent(p) => format!("{}%", p.normalize()),
            VatRate::Exempt => "zw".to_string(),
        }
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate::Percent(Decimal::from(23))
    }
}

/// Net / VAT / gross triple of a document or line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amounts {
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
}

impl Amounts {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_net(net: Decimal, rate: VatRate) -> Self {
        let net = round_money(net);
        let vat = rate.vat_on(net);
        Self {
            net,
            vat,
            gross: net + vat,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.net.is_zero() && self.vat.is_zero() && self.gross.is_zero()
    }
}

impl Add for Amounts {
    type Output = Amounts;

    fn add(self, rhs: Self) -> Self::Output {
        Amounts {
            net: self.net + rhs.net,
            vat: self.vat + rhs.vat,
            gross: self.gross + rhs.gross,
        }
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amounts {
    type Output = Amounts;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for Amounts {
    type Output = Amounts;

    fn neg(self) -> Self::Output {
        Amounts {
            net: -self.net,
            vat: -self.vat,
            gross: -self.gross,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_money(dec!(2.004)), dec!(2.00));
    }

    #[test]
    fn line_total_multiplies_then_rounds() {
        assert_eq!(line_total(dec!(45.50), dec!(3)), dec!(136.50));
        assert_eq!(line_total(dec!(33.333), dec!(1.5)), dec!(50.00));
        assert_eq!(line_total(dec!(10), dec!(-2)), dec!(-20));
    }

    #[test]
    fn oversized_line_is_rejected_not_overflowed() {
        assert_eq!(checked_line_total(dec!(45.50), dec!(3)).unwrap(), dec!(136.50));
        let huge = Decimal::from(100_000_000_000_000_000_i64);
        match checked_line_total(huge, huge) {
            Err(DomainError::Validation(msg)) if msg.contains("at most") => {}
            other => panic!("expected Validation for oversized line, got {other:?}"),
        }
        let limit = Decimal::from(MAX_LINE_MAGNITUDE);
        assert_eq!(checked_line_total(limit, -limit).unwrap(), -(limit * limit));
    }

    #[test]
    fn vat_labels() {
        assert_eq!(VatRate::percent(dec!(23.00)).unwrap().label(), "23%");
        assert_eq!(VatRate::percent(dec!(5.5)).unwrap().label(), "5.5%");
        assert_eq!(VatRate::Exempt.label(), "zw");
    }

    #[test]
    fn rejects_out_of_range_rate() {
        assert!(VatRate::percent(dec!(-1)).is_err());
        assert!(VatRate::percent(dec!(100.01)).is_err());
    }

    #[test]
    fn amounts_from_net() {
        let a = Amounts::from_net(dec!(100), VatRate::default());
        assert_eq!(a.net, dec!(100));
        assert_eq!(a.vat, dec!(23.00));
        assert_eq!(a.gross, dec!(123.00));

        let exempt = Amounts::from_net(dec!(100), VatRate::Exempt);
        assert_eq!(exempt.gross, dec!(100));
    }

    #[test]
    fn negated_amounts_cancel_out() {
        let a = Amounts::from_net(dec!(81.30), VatRate::default());
        assert!((a + -a).is_zero());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: gross always equals net + vat, and vat is symmetric under negation.
            #[test]
            fn gross_is_net_plus_vat(cents in -10_000_000i64..10_000_000i64, pct in 0u32..=100u32) {
                let net = Decimal::new(cents, 2);
                let rate = VatRate::percent(Decimal::from(pct)).unwrap();
                let a = Amounts::from_net(net, rate);
                prop_assert_eq!(a.gross, a.net + a.vat);

                let neg = Amounts::from_net(-net, rate);
                prop_assert_eq!(neg.vat, -a.vat);
            }
        }
    }
}
