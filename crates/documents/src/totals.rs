use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{Amounts, VatRate};

use crate::line::Line;

/// Net / VAT / gross of a whole document, with the per-rate breakdown printed
/// in the VAT summary table.
///
/// VAT is computed once per rate group from the group's net sum, not per line,
/// so the document VAT matches the printed summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub amounts: Amounts,
    pub by_rate: Vec<(VatRate, Amounts)>,
}

impl DocumentTotals {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a Line>) -> Self {
        let mut groups: BTreeMap<VatRate, Decimal> = BTreeMap::new();
        for line in lines.into_iter().filter(|l| !l.cancelled) {
            *groups.entry(line.vat_rate).or_default() += line.total();
        }

        let by_rate: Vec<(VatRate, Amounts)> = groups
            .into_iter()
            .map(|(rate, net)| (rate, Amounts::from_net(net, rate)))
            .collect();

        let amounts = by_rate
            .iter()
            .fold(Amounts::zero(), |acc, (_, a)| acc + *a);

        Self { amounts, by_rate }
    }

    pub fn net(&self) -> Decimal {
        self.amounts.net
    }

    pub fn vat(&self) -> Decimal {
        self.amounts.vat
    }

    pub fn gross(&self) -> Decimal {
        self.amounts.gross
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(qty: Decimal, price: Decimal, rate: VatRate) -> Line {
        Line::new("x", qty, price, rate).unwrap()
    }

    #[test]
    fn empty_document_is_zero() {
        let totals = DocumentTotals::from_lines(Vec::<Line>::new().iter());
        assert!(totals.amounts.is_zero());
        assert!(totals.by_rate.is_empty());
    }

    #[test]
    fn vat_is_rounded_per_rate_group() {
        // Per-line VAT would be 3 × 0.23 = 0.69 on 3 × 0.99; the group rounds 2.97 × 23% once.
        let lines = vec![
            line(dec!(1), dec!(0.99), VatRate::default()),
            line(dec!(1), dec!(0.99), VatRate::default()),
            line(dec!(1), dec!(0.99), VatRate::default()),
        ];
        let totals = DocumentTotals::from_lines(&lines);
        assert_eq!(totals.net(), dec!(2.97));
        assert_eq!(totals.vat(), dec!(0.68));
        assert_eq!(totals.gross(), dec!(3.65));
    }

    #[test]
    fn mixed_rates_are_broken_down() {
        let lines = vec![
            line(dec!(2), dec!(50), VatRate::default()),
            line(dec!(1), dec!(30), VatRate::Exempt),
        ];
        let totals = DocumentTotals::from_lines(&lines);
        assert_eq!(totals.by_rate.len(), 2);
        assert_eq!(totals.net(), dec!(130));
        assert_eq!(totals.vat(), dec!(23));
        assert_eq!(totals.gross(), dec!(153));
    }

    #[test]
    fn cancelled_lines_are_excluded() {
        let mut cancelled = line(dec!(10), dec!(100), VatRate::default());
        cancelled.cancelled = true;
        let lines = vec![line(dec!(1), dec!(100), VatRate::default()), cancelled];
        let totals = DocumentTotals::from_lines(&lines);
        assert_eq!(totals.net(), dec!(100));
        assert_eq!(totals.gross(), dec!(123));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: mirrored lines produce exactly negated totals.
            #[test]
            fn negated_lines_negate_totals(
                items in proptest::collection::vec((1i64..500, 0i64..100_000, prop::bool::ANY), 1..12)
            ) {
                let lines: Vec<Line> = items
                    .iter()
                    .map(|(q, p, exempt)| {
                        let rate = if *exempt { VatRate::Exempt } else { VatRate::default() };
                        line(Decimal::new(*q, 1), Decimal::new(*p, 2), rate)
                    })
                    .collect();
                let mirrored: Vec<Line> = lines.iter().map(Line::negated).collect();

                let t = DocumentTotals::from_lines(&lines);
                let m = DocumentTotals::from_lines(&mirrored);
                prop_assert_eq!(m.amounts, -t.amounts);
                prop_assert_eq!(t.gross(), t.net() + t.vat());
            }
        }
    }
}
