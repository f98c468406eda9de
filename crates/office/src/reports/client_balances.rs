use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use brokerdesk_core::PersonId;

use crate::books::Books;

/// Receivables of one client, in the client's document currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientBalance {
    pub person_id: PersonId,
    pub person: String,
    pub currency: String,
    /// Gross of regular invoices less their stornos.
    pub invoiced: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
    pub invoice_count: usize,
}

impl ClientBalance {
    fn new(person_id: PersonId, person: &str, currency: &str) -> Self {
        Self {
            person_id,
            person: person.to_string(),
            currency: currency.to_string(),
            invoiced: Decimal::ZERO,
            paid: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            invoice_count: 0,
        }
    }
}

/// One row per (client, currency) that has invoices, sorted by client name.
pub fn client_balances(books: &Books) -> Vec<ClientBalance> {
    let mut balances: BTreeMap<(PersonId, String), ClientBalance> = BTreeMap::new();
    for invoice in books.invoices.values() {
        let person_id = invoice.header().person_id;
        let currency = invoice.header().currency.code().to_string();
        let balance = balances
            .entry((person_id, currency.clone()))
            .or_insert_with(|| {
                ClientBalance::new(person_id, books.person_name(person_id), &currency)
            });
        balance.invoiced += invoice.gross();
        balance.paid += invoice.payed();
        if !invoice.is_storno() {
            balance.invoice_count += 1;
        }
    }

    let mut rows: Vec<ClientBalance> = balances
        .into_values()
        .map(|mut b| {
            b.outstanding = b.invoiced - b.paid;
            b
        })
        .collect();
    rows.sort_by(|a, b| a.person.to_lowercase().cmp(&b.person.to_lowercase()));
    rows
}
