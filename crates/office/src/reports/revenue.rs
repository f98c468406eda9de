use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use brokerdesk_core::Amounts;

use crate::books::Books;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    /// 1..=12
    pub month: u32,
    pub net: Decimal,
    pub vat: Decimal,
    pub gross: Decimal,
    pub invoices: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueReport {
    pub year: i32,
    pub currency: String,
    pub months: Vec<MonthlyRevenue>,
    pub total: Amounts,
}

/// Invoiced revenue per month of `year` in one currency, by issue date.
///
/// Stornos count in the month they are issued, so a cancellation in a later
/// month lowers that month.
pub fn revenue(books: &Books, year: i32, currency: &str) -> RevenueReport {
    let mut months: Vec<MonthlyRevenue> = (1..=12)
        .map(|month| MonthlyRevenue {
            month,
            net: Decimal::ZERO,
            vat: Decimal::ZERO,
            gross: Decimal::ZERO,
            invoices: 0,
        })
        .collect();
    let mut total = Amounts::zero();

    for invoice in books
        .invoices
        .values()
        .filter(|i| i.header().issued_on.year() == year && i.header().currency.code() == currency)
    {
        let slot = &mut months[invoice.header().issued_on.month0() as usize];
        slot.net += invoice.value();
        slot.vat += invoice.vat();
        slot.gross += invoice.gross();
        slot.invoices += 1;
        total += Amounts {
            net: invoice.value(),
            vat: invoice.vat(),
            gross: invoice.gross(),
        };
    }

    RevenueReport {
        year,
        currency: currency.to_string(),
        months,
        total,
    }
}
