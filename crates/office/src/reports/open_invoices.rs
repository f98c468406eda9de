//! Invoices still waiting for payment.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use brokerdesk_core::{Entity, InvoiceId, PersonId};

use crate::books::Books;

/// Read model: open invoice with its receivable details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenInvoice {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub person_id: PersonId,
    pub person: String,
    pub due_on: NaiveDate,
    pub gross: Decimal,
    pub payed: Decimal,
    pub outstanding: Decimal,
    /// Days past the due date; zero or negative when not yet due.
    pub days_overdue: i64,
    pub is_overdue: bool,
}

/// Summary statistics for open invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenInvoicesSummary {
    pub count: usize,
    pub total_outstanding: Decimal,
    pub overdue_count: usize,
    pub overdue_amount: Decimal,
    pub invoices: Vec<OpenInvoice>,
}

/// Regular, non-cancelled invoices with something outstanding, oldest due first.
pub fn open_invoices(books: &Books, today: NaiveDate) -> OpenInvoicesSummary {
    let mut invoices: Vec<OpenInvoice> = books
        .invoices
        .values()
        .filter(|i| i.can_accept_payment())
        .map(|i| {
            let days_overdue = (today - i.due_on()).num_days();
            OpenInvoice {
                invoice_id: i.id(),
                number: i.number().to_string(),
                person_id: i.header().person_id,
                person: books.person_name(i.header().person_id).to_string(),
                due_on: i.due_on(),
                gross: i.gross(),
                payed: i.payed(),
                outstanding: i.outstanding(),
                days_overdue,
                is_overdue: i.is_overdue(today),
            }
        })
        .collect();
    invoices.sort_by(|a, b| a.due_on.cmp(&b.due_on).then_with(|| a.number.cmp(&b.number)));

    let overdue: Vec<&OpenInvoice> = invoices.iter().filter(|i| i.is_overdue).collect();
    OpenInvoicesSummary {
        count: invoices.len(),
        total_outstanding: invoices.iter().map(|i| i.outstanding).sum(),
        overdue_count: overdue.len(),
        overdue_amount: overdue.iter().map(|i| i.outstanding).sum(),
        invoices,
    }
}
