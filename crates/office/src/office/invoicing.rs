use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use brokerdesk_catalog::Currency;
use brokerdesk_core::{
    DomainError, ExpectedVersion, InvoiceElementId, InvoiceId, OrderElementId, OrderId, PersonId,
};
use brokerdesk_documents::{DocumentKind, Invoice, InvoiceElement, Line, NewInvoice, OrderLink};

use super::{Office, check_version, new_header};
use crate::books::Books;
use crate::error::{OfficeError, OfficeResult};
use crate::reconcile::{after_invoice_change, linked_orders};

/// Element of an invoice or proforma being drafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftElement {
    /// Free-standing line, not tied to any order.
    Line(Line),
    /// Bill an order element. With `line: None` the element's remaining
    /// amount is billed.
    FromOrder {
        order_id: OrderId,
        element_id: OrderElementId,
        line: Option<Line>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInvoice {
    pub person_id: PersonId,
    pub currency: Option<Currency>,
    pub issued_on: NaiveDate,
    /// Defaults to `issued_on`.
    pub sale_date: Option<NaiveDate>,
    /// `issued_on` + payment days when `None`.
    pub due_on: Option<NaiveDate>,
    pub elements: Vec<DraftElement>,
}

/// Services named on lines must exist in the price list.
pub(super) fn check_services(books: &Books, lines: &[Line]) -> OfficeResult<()> {
    for service_id in lines.iter().filter_map(|l| l.service_id) {
        books.services.require(&service_id, "service")?;
    }
    Ok(())
}

/// Turn a draft into a line and its order link, checking the link points at
/// a live element of an order of the same client and currency.
pub(super) fn resolve_element(
    books: &Books,
    person_id: PersonId,
    currency: &Currency,
    draft: DraftElement,
) -> OfficeResult<(Line, Option<OrderLink>)> {
    let (order_id, element_id, line) = match draft {
        DraftElement::Line(line) => {
            check_services(books, std::slice::from_ref(&line))?;
            return Ok((line, None));
        }
        DraftElement::FromOrder {
            order_id,
            element_id,
            line,
        } => (order_id, element_id, line),
    };

    let order = books.order(order_id)?;
    if order.header().person_id != person_id {
        return Err(DomainError::invariant(format!(
            "order {} belongs to another client",
            order.number()
        ))
        .into());
    }
    if order.header().currency.code() != currency.code() {
        return Err(DomainError::invariant(format!(
            "order {} is in {}, document is in {}",
            order.number(),
            order.header().currency,
            currency
        ))
        .into());
    }
    let element = order
        .element(element_id)
        .ok_or_else(|| OfficeError::not_found("order element", element_id))?;
    if element.is_cancelled() {
        return Err(DomainError::invariant("cannot bill a cancelled order element").into());
    }

    let line = match line {
        Some(line) => line,
        None if element.invoiced().is_zero() => element.line().clone(),
        None if element.remaining() > Decimal::ZERO => Line {
            quantity: Decimal::ONE,
            price: element.remaining(),
            ..element.line().clone()
        },
        None => {
            return Err(DomainError::invariant(format!(
                "order {} element \"{}\" is fully invoiced",
                order.number(),
                element.line().description
            ))
            .into());
        }
    };
    check_services(books, std::slice::from_ref(&line))?;
    Ok((line, Some(OrderLink { order_id, element_id })))
}

impl Office {
    pub fn issue_invoice(&self, cmd: IssueInvoice) -> OfficeResult<InvoiceId> {
        let currency = cmd.currency.unwrap_or_else(|| self.settings().currency.clone());
        let due_on = cmd.due_on.unwrap_or_else(|| self.due_date(cmd.issued_on));
        self.transact("issue_invoice", |books, now| {
            let elements = cmd
                .elements
                .into_iter()
                .map(|draft| {
                    let (line, link) = resolve_element(books, cmd.person_id, &currency, draft)?;
                    Ok(InvoiceElement::new(InvoiceElementId::new(), line, link)?)
                })
                .collect::<OfficeResult<Vec<_>>>()?;
            let header = new_header(
                books,
                DocumentKind::Invoice,
                cmd.person_id,
                currency,
                cmd.issued_on,
                now,
            )?;
            let id = InvoiceId::new();
            let invoice = Invoice::issue(
                id,
                NewInvoice {
                    header,
                    sale_date: cmd.sale_date.unwrap_or(cmd.issued_on),
                    due_on,
                    elements,
                    proforma_id: None,
                },
            )?;
            info!(invoice = invoice.number(), gross = %invoice.gross(), "invoice issued");
            books.invoices.upsert(id, invoice);
            after_invoice_change(books, id, BTreeSet::new())?;
            Ok(id)
        })
    }

    /// Invoice everything still open on an order.
    pub fn invoice_order(
        &self,
        order_id: OrderId,
        issued_on: NaiveDate,
    ) -> OfficeResult<InvoiceId> {
        let (person_id, currency, elements) = self.read(|books| {
            books.order(order_id).map(|order| {
                let open = order
                    .elements()
                    .iter()
                    .filter(|e| !e.is_cancelled() && e.remaining() > Decimal::ZERO)
                    .map(|e| DraftElement::FromOrder {
                        order_id,
                        element_id: e.id(),
                        line: None,
                    })
                    .collect::<Vec<_>>();
                (order.header().person_id, order.header().currency.clone(), open)
            })
        })??;
        if elements.is_empty() {
            return Err(DomainError::invariant("order has nothing left to invoice").into());
        }
        self.issue_invoice(IssueInvoice {
            person_id,
            currency: Some(currency),
            issued_on,
            sale_date: None,
            due_on: None,
            elements,
        })
    }

    pub fn add_invoice_element(
        &self,
        invoice_id: InvoiceId,
        draft: DraftElement,
        expected: ExpectedVersion,
    ) -> OfficeResult<InvoiceElementId> {
        self.transact("add_invoice_element", |books, now| {
            let invoice = books.invoice(invoice_id)?;
            check_version(invoice, expected)?;
            let person_id = invoice.header().person_id;
            let currency = invoice.header().currency.clone();
            let before = linked_orders(books, invoice_id)?;

            let (line, link) = resolve_element(books, person_id, &currency, draft)?;
            let element_id = InvoiceElementId::new();
            books
                .invoice_mut(invoice_id)?
                .add_element(InvoiceElement::new(element_id, line, link)?, now)?;
            after_invoice_change(books, invoice_id, before)?;
            Ok(element_id)
        })
    }

    /// Replace an element's line; the order link is kept.
    pub fn update_invoice_element(
        &self,
        invoice_id: InvoiceId,
        element_id: InvoiceElementId,
        line: Line,
        expected: ExpectedVersion,
    ) -> OfficeResult<()> {
        self.transact("update_invoice_element", |books, now| {
            check_services(books, std::slice::from_ref(&line))?;
            check_version(books.invoice(invoice_id)?, expected)?;
            books.invoice_element(invoice_id, element_id)?;
            let before = linked_orders(books, invoice_id)?;
            books
                .invoice_mut(invoice_id)?
                .update_element(element_id, line, now)?;
            after_invoice_change(books, invoice_id, before)?;
            Ok(())
        })
    }

    pub fn cancel_invoice_element(
        &self,
        invoice_id: InvoiceId,
        element_id: InvoiceElementId,
    ) -> OfficeResult<()> {
        self.transact("cancel_invoice_element", |books, now| {
            books.invoice_element(invoice_id, element_id)?;
            let before = linked_orders(books, invoice_id)?;
            books.invoice_mut(invoice_id)?.cancel_element(element_id, now)?;
            after_invoice_change(books, invoice_id, before)?;
            Ok(())
        })
    }

    pub fn set_invoice_due_date(
        &self,
        invoice_id: InvoiceId,
        due_on: NaiveDate,
    ) -> OfficeResult<()> {
        self.transact("set_invoice_due_date", |books, now| {
            books.invoice_mut(invoice_id)?.set_due_on(due_on, now)?;
            Ok(())
        })
    }

    /// Cancel an invoice by issuing its storno (numbered from the correction
    /// serial). The order elements it billed become billable again.
    pub fn storno_invoice(
        &self,
        invoice_id: InvoiceId,
        issued_on: NaiveDate,
    ) -> OfficeResult<InvoiceId> {
        self.transact("storno_invoice", |books, now| {
            let original_issued_on = books.invoice(invoice_id)?.header().issued_on;
            if issued_on < original_issued_on {
                return Err(DomainError::validation(
                    "storno cannot precede the invoice it cancels",
                )
                .into());
            }
            let number = books.serials.issue(DocumentKind::Correction, issued_on)?;

            let storno_id = InvoiceId::new();
            let original = books.invoice(invoice_id)?;
            let header = original.header().derive(number, issued_on, now);
            let storno = Invoice::storno(original, storno_id, header)?;

            books.invoice_mut(invoice_id)?.mark_cancelled_by(storno_id, now)?;
            info!(invoice = storno.number(), cancels = %invoice_id, "storno issued");
            books.invoices.upsert(storno_id, storno);
            after_invoice_change(books, storno_id, BTreeSet::new())?;
            Ok(storno_id)
        })
    }
}
