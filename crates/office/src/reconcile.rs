//! Reconciliation of cached document values.
//!
//! Cached fields and their sources:
//!
//! ```text
//! order.value           <- Σ non-cancelled order element totals
//! order_element.invoiced <- Σ non-cancelled invoice element totals linked to it
//! order.invoiced        <- Σ order_element.invoiced
//! invoice.value/vat/gross <- non-cancelled invoice elements (VAT per rate group)
//! invoice.payed         <- Σ payment element values allocated to it
//! ```
//!
//! Changes flow order elements → invoices → orders' invoiced cache, and
//! payments → invoices' payed cache. Every function here is idempotent.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use brokerdesk_core::{DomainError, Entity, InvoiceId, OrderElementId, OrderId};

use crate::books::Books;
use crate::error::OfficeResult;

type InvoicedIndex = HashMap<OrderId, HashMap<OrderElementId, Decimal>>;

/// Counts of records whose caches were out of date during a full repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RepairSummary {
    pub orders: usize,
    pub invoices: usize,
    pub proformas: usize,
    pub offers: usize,
}

impl RepairSummary {
    pub fn total(&self) -> usize {
        self.orders + self.invoices + self.proformas + self.offers
    }
}

/// Invoiced amount per order element, across all invoices.
fn invoiced_index(books: &Books) -> InvoicedIndex {
    let mut index: InvoicedIndex = HashMap::new();
    for invoice in books.invoices.values() {
        for element in invoice.elements().iter().filter(|e| !e.is_cancelled()) {
            if let Some(link) = element.order_link() {
                *index
                    .entry(link.order_id)
                    .or_default()
                    .entry(link.element_id)
                    .or_default() += element.total();
            }
        }
    }
    index
}

fn invoiced_for_order(books: &Books, order_id: OrderId) -> HashMap<OrderElementId, Decimal> {
    let mut per_element: HashMap<OrderElementId, Decimal> = HashMap::new();
    for invoice in books.invoices.values() {
        for element in invoice.elements().iter().filter(|e| !e.is_cancelled()) {
            match element.order_link() {
                Some(link) if link.order_id == order_id => {
                    *per_element.entry(link.element_id).or_default() += element.total();
                }
                _ => {}
            }
        }
    }
    per_element
}

fn payed_for_invoice(books: &Books, invoice_id: InvoiceId) -> Decimal {
    books
        .payments
        .values()
        .map(|p| p.allocated_to(invoice_id))
        .sum()
}

/// Recompute the cached value of an order from its elements.
pub fn recompute_order(books: &mut Books, order_id: OrderId) -> OfficeResult<bool> {
    Ok(books.order_mut(order_id)?.recompute_value())
}

/// Recompute value / VAT / gross of an invoice from its elements.
pub fn recompute_invoice(books: &mut Books, invoice_id: InvoiceId) -> OfficeResult<bool> {
    Ok(books.invoice_mut(invoice_id)?.recompute_totals())
}

/// Recompute `invoiced` of every element of an order, and of the order.
pub fn recompute_order_invoiced(books: &mut Books, order_id: OrderId) -> OfficeResult<bool> {
    let per_element = invoiced_for_order(books, order_id);
    let changed = books.order_mut(order_id)?.apply_invoiced(&per_element);
    if changed {
        debug!(%order_id, "order invoiced cache updated");
    }
    Ok(changed)
}

/// Recompute the `payed` cache of an invoice from all payments.
pub fn recompute_invoice_payed(books: &mut Books, invoice_id: InvoiceId) -> OfficeResult<bool> {
    let payed = payed_for_invoice(books, invoice_id);
    let changed = books.invoice_mut(invoice_id)?.apply_payed(payed);
    if changed {
        debug!(%invoice_id, %payed, "invoice payed cache updated");
    }
    Ok(changed)
}

/// No order element may be invoiced beyond its own total.
pub fn check_invoicing_limits(books: &Books, order_id: OrderId) -> OfficeResult<()> {
    let order = books.order(order_id)?;
    for element in order.elements() {
        if element.invoiced() > element.total() && element.total() >= Decimal::ZERO {
            return Err(DomainError::invariant(format!(
                "order {} element \"{}\" would be invoiced for {} of {}",
                order.number(),
                element.line().description,
                element.invoiced(),
                element.total()
            ))
            .into());
        }
    }
    Ok(())
}

/// An invoice may not be payed beyond its gross (or below zero).
pub fn check_payment_limits(books: &Books, invoice_id: InvoiceId) -> OfficeResult<()> {
    let invoice = books.invoice(invoice_id)?;
    if invoice.payed() < Decimal::ZERO {
        return Err(DomainError::invariant(format!(
            "invoice {} would have a negative payed amount",
            invoice.number()
        ))
        .into());
    }
    if !invoice.is_storno() && invoice.payed() > invoice.gross() {
        return Err(DomainError::invariant(format!(
            "invoice {} would be overpaid ({} of {})",
            invoice.number(),
            invoice.payed(),
            invoice.gross()
        ))
        .into());
    }
    Ok(())
}

/// Orders linked from an invoice's elements.
pub fn linked_orders(books: &Books, invoice_id: InvoiceId) -> OfficeResult<BTreeSet<OrderId>> {
    Ok(books
        .invoice(invoice_id)?
        .order_links()
        .map(|l| l.order_id)
        .collect())
}

/// Propagate a change to an invoice's elements.
///
/// `previously_linked` are the orders the invoice pointed at before the
/// change, so orders that lost a link are reconciled too.
pub fn after_invoice_change(
    books: &mut Books,
    invoice_id: InvoiceId,
    previously_linked: BTreeSet<OrderId>,
) -> OfficeResult<()> {
    recompute_invoice(books, invoice_id)?;
    let mut orders = previously_linked;
    orders.extend(linked_orders(books, invoice_id)?);
    for order_id in orders {
        recompute_order_invoiced(books, order_id)?;
        check_invoicing_limits(books, order_id)?;
    }
    Ok(())
}

/// Propagate a new or cancelled payment to the invoices it touches.
pub fn after_payment_change(
    books: &mut Books,
    invoices: impl IntoIterator<Item = InvoiceId>,
) -> OfficeResult<()> {
    let invoices: BTreeSet<InvoiceId> = invoices.into_iter().collect();
    for invoice_id in invoices {
        recompute_invoice_payed(books, invoice_id)?;
        check_payment_limits(books, invoice_id)?;
    }
    Ok(())
}

/// Rebuild every cache from source rows.
///
/// Used to repair books loaded from an older or hand-edited snapshot.
pub fn recompute_all(books: &mut Books) -> RepairSummary {
    let mut summary = RepairSummary::default();

    for offer in books.offers.values_mut() {
        if offer.recompute_value() {
            summary.offers += 1;
        }
    }
    for proforma in books.proformas.values_mut() {
        if proforma.recompute_totals() {
            summary.proformas += 1;
        }
    }

    let mut payed: HashMap<InvoiceId, Decimal> = HashMap::new();
    for payment in books.payments.values() {
        for element in payment.elements() {
            *payed.entry(element.invoice_id).or_default() += element.value;
        }
    }
    for invoice in books.invoices.values_mut() {
        let invoice_id = invoice.id();
        let totals_changed = invoice.recompute_totals();
        let payed_changed =
            invoice.apply_payed(payed.get(&invoice_id).copied().unwrap_or(Decimal::ZERO));
        if totals_changed || payed_changed {
            summary.invoices += 1;
        }
    }

    let index = invoiced_index(books);
    let empty = HashMap::new();
    for order in books.orders.values_mut() {
        let order_id = order.id();
        let value_changed = order.recompute_value();
        let invoiced_changed = order.apply_invoiced(index.get(&order_id).unwrap_or(&empty));
        if value_changed || invoiced_changed {
            summary.orders += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_catalog::Currency;
    use brokerdesk_core::{InvoiceElementId, PersonId, VatRate};
    use brokerdesk_documents::{
        Header, Invoice, InvoiceElement, Line, NewInvoice, Order, OrderElement, OrderLink,
    };
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn line(qty: Decimal, price: Decimal) -> Line {
        Line::new("Tłumaczenie", qty, price, VatRate::default()).unwrap()
    }

    /// Books with one order (two elements) and one invoice billing the first element.
    fn books() -> (Books, OrderId, OrderElementId, InvoiceId) {
        let mut books = Books::new();
        let person = PersonId::new();

        let order_id = OrderId::new();
        let mut order = Order::new(
            order_id,
            Header::new("ZL/1/2026", person, Currency::pln(), today(), Utc::now()),
            "Dokumenty samochodowe",
        );
        let first = OrderElement::new(OrderElementId::new(), line(dec!(4), dec!(50))).unwrap();
        let first_id = first.id();
        order.add_element(first, Utc::now()).unwrap();
        order
            .add_element(
                OrderElement::new(OrderElementId::new(), line(dec!(1), dec!(80))).unwrap(),
                Utc::now(),
            )
            .unwrap();
        books.orders.upsert(order_id, order);

        let invoice_id = InvoiceId::new();
        let invoice = Invoice::issue(
            invoice_id,
            NewInvoice {
                header: Header::new("FV/1/2026", person, Currency::pln(), today(), Utc::now()),
                sale_date: today(),
                due_on: today(),
                elements: vec![InvoiceElement::new(
                    InvoiceElementId::new(),
                    line(dec!(4), dec!(50)),
                    Some(OrderLink { order_id, element_id: first_id }),
                )
                .unwrap()],
                proforma_id: None,
            },
        )
        .unwrap();
        books.invoices.upsert(invoice_id, invoice);

        (books, order_id, first_id, invoice_id)
    }

    #[test]
    fn order_invoiced_follows_linked_invoice_elements() {
        let (mut books, order_id, first_id, invoice_id) = books();
        after_invoice_change(&mut books, invoice_id, BTreeSet::new()).unwrap();

        let order = books.order(order_id).unwrap();
        assert_eq!(order.value(), dec!(280));
        assert_eq!(order.invoiced(), dec!(200));
        assert_eq!(order.element(first_id).unwrap().remaining(), dec!(0));
        assert_eq!(order.remaining(), dec!(80));
    }

    #[test]
    fn cancelled_invoice_element_releases_order_element() {
        let (mut books, order_id, _, invoice_id) = books();
        after_invoice_change(&mut books, invoice_id, BTreeSet::new()).unwrap();

        let element_id = books.invoice(invoice_id).unwrap().elements()[0].id();
        let before = linked_orders(&books, invoice_id).unwrap();
        books
            .invoice_mut(invoice_id)
            .unwrap()
            .cancel_element(element_id, Utc::now())
            .unwrap();
        after_invoice_change(&mut books, invoice_id, before).unwrap();

        assert_eq!(books.order(order_id).unwrap().invoiced(), dec!(0));
        assert_eq!(books.invoice(invoice_id).unwrap().value(), dec!(0));
    }

    #[test]
    fn over_invoicing_is_rejected() {
        let (mut books, order_id, first_id, invoice_id) = books();
        books
            .invoice_mut(invoice_id)
            .unwrap()
            .add_element(
                InvoiceElement::new(
                    InvoiceElementId::new(),
                    line(dec!(1), dec!(0.01)),
                    Some(OrderLink { order_id, element_id: first_id }),
                )
                .unwrap(),
                Utc::now(),
            )
            .unwrap();

        let err = after_invoice_change(&mut books, invoice_id, BTreeSet::new()).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn recompute_all_repairs_stale_caches_and_is_idempotent() {
        let (mut books, order_id, _, _) = books();
        let summary = recompute_all(&mut books);
        assert_eq!(summary.orders, 1);
        assert_eq!(books.order(order_id).unwrap().invoiced(), dec!(200));

        let again = recompute_all(&mut books);
        assert_eq!(again.total(), 0);
    }
}
