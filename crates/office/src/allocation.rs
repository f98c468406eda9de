//! Allocation of a payment across invoices.
//!
//! - One invoice: any amount up to the outstanding gross (partial payments).
//! - Several invoices: all-or-nothing. The amount must settle every listed
//!   invoice exactly; otherwise nothing is allocated.
//! - Explicit split: caller-chosen values, each within the invoice's
//!   outstanding amount, summing to the payment amount.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_catalog::Currency;
use brokerdesk_core::{DomainError, Entity, InvoiceId, PersonId};
use brokerdesk_documents::Invoice;

use crate::books::Books;
use crate::error::OfficeResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allocation {
    /// Let the office split the amount over these invoices.
    Invoices(Vec<InvoiceId>),
    /// Caller-chosen split.
    Explicit(Vec<(InvoiceId, Decimal)>),
}

impl Allocation {
    pub fn single(invoice_id: InvoiceId) -> Self {
        Allocation::Invoices(vec![invoice_id])
    }

    fn invoice_ids(&self) -> Vec<InvoiceId> {
        match self {
            Allocation::Invoices(ids) => ids.clone(),
            Allocation::Explicit(split) => split.iter().map(|(id, _)| *id).collect(),
        }
    }
}

/// Decide the per-invoice values of a payment. Pure: `books` is not modified.
pub fn plan(
    books: &Books,
    person_id: PersonId,
    currency: &Currency,
    amount: Decimal,
    allocation: &Allocation,
) -> OfficeResult<Vec<(InvoiceId, Decimal)>> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::validation("payment amount must be positive").into());
    }

    let ids = allocation.invoice_ids();
    if ids.is_empty() {
        return Err(DomainError::validation("payment must name at least one invoice").into());
    }
    let mut seen = HashSet::new();
    let mut invoices = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(DomainError::validation(format!("invoice {id} is listed twice")).into());
        }
        let invoice = books.invoice(id)?;
        ensure_payable(invoice, person_id, currency)?;
        invoices.push(invoice);
    }

    match allocation {
        Allocation::Invoices(_) if invoices.len() == 1 => {
            let invoice = invoices[0];
            if amount > invoice.outstanding() {
                return Err(DomainError::invariant(format!(
                    "payment of {amount} exceeds the {} outstanding on {}",
                    invoice.outstanding(),
                    invoice.number()
                ))
                .into());
            }
            Ok(vec![(invoice.id(), amount)])
        }
        Allocation::Invoices(_) => {
            let outstanding: Decimal = invoices.iter().map(|i| i.outstanding()).sum();
            if amount != outstanding {
                return Err(DomainError::invariant(format!(
                    "a payment for several invoices must settle all of them: \
                     outstanding {outstanding}, paid {amount}"
                ))
                .into());
            }
            Ok(invoices
                .iter()
                .map(|i| (i.id(), i.outstanding()))
                .collect())
        }
        Allocation::Explicit(split) => {
            for ((_, value), invoice) in split.iter().zip(&invoices) {
                if *value <= Decimal::ZERO {
                    return Err(DomainError::validation("allocated value must be positive").into());
                }
                if *value > invoice.outstanding() {
                    return Err(DomainError::invariant(format!(
                        "{value} exceeds the {} outstanding on {}",
                        invoice.outstanding(),
                        invoice.number()
                    ))
                    .into());
                }
            }
            let allocated: Decimal = split.iter().map(|(_, v)| *v).sum();
            if allocated != amount {
                return Err(DomainError::invariant(format!(
                    "allocations sum to {allocated}, payment amount is {amount}"
                ))
                .into());
            }
            Ok(split.clone())
        }
    }
}

fn ensure_payable(invoice: &Invoice, person_id: PersonId, currency: &Currency) -> OfficeResult<()> {
    if invoice.header().person_id != person_id {
        return Err(DomainError::invariant(format!(
            "invoice {} belongs to another client",
            invoice.number()
        ))
        .into());
    }
    if invoice.header().currency.code() != currency.code() {
        return Err(DomainError::invariant(format!(
            "invoice {} is in {}, payment is in {}",
            invoice.number(),
            invoice.header().currency,
            currency
        ))
        .into());
    }
    if !invoice.can_accept_payment() {
        return Err(DomainError::invariant(format!(
            "invoice {} cannot accept payments (storno, cancelled or settled)",
            invoice.number()
        ))
        .into());
    }
    Ok(())
}
