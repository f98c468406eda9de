use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use tracing::info;

use brokerdesk_catalog::Currency;
use brokerdesk_core::{
    DomainError, ExpectedVersion, InvoiceId, OfferId, OrderElementId, OrderId, PersonId,
    ProformaId, StatusId,
};
use brokerdesk_documents::{DocumentKind, Line, Offer, Order, OrderElement, OrderLink, Proforma};

use super::invoicing::{DraftElement, check_services, resolve_element};
use super::{Office, check_version, new_header};
use crate::books::Books;
use crate::error::OfficeResult;
use crate::reconcile::after_invoice_change;

/// Offers without an explicit validity are valid this many days.
const OFFER_VALIDITY_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOffer {
    pub person_id: PersonId,
    /// Office currency when `None`.
    pub currency: Option<Currency>,
    pub issued_on: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub person_id: PersonId,
    pub currency: Option<Currency>,
    pub issued_on: NaiveDate,
    pub description: String,
    pub deadline: Option<NaiveDate>,
    pub status_id: Option<StatusId>,
    /// May be empty; elements can be added later.
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProforma {
    pub person_id: PersonId,
    pub currency: Option<Currency>,
    pub issued_on: NaiveDate,
    /// `issued_on` + payment days when `None`.
    pub due_on: Option<NaiveDate>,
    pub elements: Vec<DraftElement>,
}

impl Office {
    pub fn create_offer(&self, cmd: CreateOffer) -> OfficeResult<OfferId> {
        let currency = cmd.currency.unwrap_or_else(|| self.settings().currency.clone());
        self.transact("create_offer", |books, now| {
            check_services(books, &cmd.lines)?;
            let header = new_header(
                books,
                DocumentKind::Offer,
                cmd.person_id,
                currency,
                cmd.issued_on,
                now,
            )?;
            let valid_until = cmd
                .valid_until
                .unwrap_or(cmd.issued_on + Days::new(OFFER_VALIDITY_DAYS));
            let id = OfferId::new();
            let offer = Offer::new(id, header, valid_until, cmd.lines)?;
            info!(offer = offer.number(), value = %offer.value(), "offer created");
            books.offers.upsert(id, offer);
            Ok(id)
        })
    }

    /// Accept an offer, creating the order that carries its elements.
    pub fn accept_offer(&self, offer_id: OfferId, issued_on: NaiveDate) -> OfficeResult<OrderId> {
        self.transact("accept_offer", |books, now| {
            let (person_id, currency) = {
                let offer = books.offers.require(&offer_id, "offer")?;
                (offer.header().person_id, offer.header().currency.clone())
            };
            let header = new_header(
                books,
                DocumentKind::Order,
                person_id,
                currency,
                issued_on,
                now,
            )?;
            let order_id = OrderId::new();
            let order = books
                .offers
                .require_mut(&offer_id, "offer")?
                .accept(order_id, header, now)?;
            info!(order = order.number(), value = %order.value(), "offer accepted");
            books.orders.upsert(order_id, order);
            Ok(order_id)
        })
    }

    pub fn create_order(&self, cmd: CreateOrder) -> OfficeResult<OrderId> {
        let currency = cmd.currency.unwrap_or_else(|| self.settings().currency.clone());
        self.transact("create_order", |books, now| {
            check_services(books, &cmd.lines)?;
            if let Some(status_id) = cmd.status_id {
                books.statuses.require(&status_id, "status")?;
            }
            let header = new_header(
                books,
                DocumentKind::Order,
                cmd.person_id,
                currency,
                cmd.issued_on,
                now,
            )?;
            let id = OrderId::new();
            let mut order = Order::new(id, header, cmd.description);
            order.set_deadline(cmd.deadline, now)?;
            if cmd.status_id.is_some() {
                order.set_status(cmd.status_id, now);
            }
            for line in cmd.lines {
                order.add_element(OrderElement::new(OrderElementId::new(), line)?, now)?;
            }
            info!(order = order.number(), value = %order.value(), "order created");
            books.orders.upsert(id, order);
            Ok(id)
        })
    }

    pub fn add_order_element(
        &self,
        order_id: OrderId,
        line: Line,
        expected: ExpectedVersion,
    ) -> OfficeResult<OrderElementId> {
        self.transact("add_order_element", |books, now| {
            check_services(books, std::slice::from_ref(&line))?;
            let order = books.order_mut(order_id)?;
            check_version(order, expected)?;
            let id = OrderElementId::new();
            order.add_element(OrderElement::new(id, line)?, now)?;
            Ok(id)
        })
    }

    /// Replace an element's line; its total may not drop below what was invoiced.
    pub fn update_order_element(
        &self,
        order_id: OrderId,
        element_id: OrderElementId,
        line: Line,
        expected: ExpectedVersion,
    ) -> OfficeResult<()> {
        self.transact("update_order_element", |books, now| {
            check_services(books, std::slice::from_ref(&line))?;
            books.order_element(order_id, element_id)?;
            let order = books.order_mut(order_id)?;
            check_version(order, expected)?;
            order.update_element(element_id, line, now)?;
            Ok(())
        })
    }

    pub fn cancel_order_element(
        &self,
        order_id: OrderId,
        element_id: OrderElementId,
    ) -> OfficeResult<()> {
        self.transact("cancel_order_element", |books, now| {
            books.order_element(order_id, element_id)?;
            books.order_mut(order_id)?.cancel_element(element_id, now)?;
            ensure_not_on_proforma(books, order_id, element_id)?;
            Ok(())
        })
    }

    /// Delete an element outright. Only elements nothing points at can go.
    pub fn remove_order_element(
        &self,
        order_id: OrderId,
        element_id: OrderElementId,
    ) -> OfficeResult<()> {
        self.transact("remove_order_element", |books, now| {
            books.order_element(order_id, element_id)?;
            ensure_not_linked(books, order_id, element_id)?;
            books.order_mut(order_id)?.remove_element(element_id, now)?;
            Ok(())
        })
    }

    pub fn set_order_status(
        &self,
        order_id: OrderId,
        status_id: Option<StatusId>,
    ) -> OfficeResult<()> {
        self.transact("set_order_status", |books, now| {
            if let Some(status_id) = status_id {
                books.statuses.require(&status_id, "status")?;
            }
            books.order_mut(order_id)?.set_status(status_id, now);
            Ok(())
        })
    }

    pub fn set_order_deadline(
        &self,
        order_id: OrderId,
        deadline: Option<NaiveDate>,
    ) -> OfficeResult<()> {
        self.transact("set_order_deadline", |books, now| {
            books.order_mut(order_id)?.set_deadline(deadline, now)?;
            Ok(())
        })
    }

    pub fn create_proforma(&self, cmd: CreateProforma) -> OfficeResult<ProformaId> {
        let currency = cmd.currency.unwrap_or_else(|| self.settings().currency.clone());
        let due_on = cmd.due_on.unwrap_or_else(|| self.due_date(cmd.issued_on));
        self.transact("create_proforma", |books, now| {
            let elements = cmd
                .elements
                .into_iter()
                .map(|draft| resolve_element(books, cmd.person_id, &currency, draft))
                .collect::<OfficeResult<Vec<_>>>()?;
            let header = new_header(
                books,
                DocumentKind::Proforma,
                cmd.person_id,
                currency,
                cmd.issued_on,
                now,
            )?;
            let id = ProformaId::new();
            let proforma = Proforma::new(id, header, due_on, elements)?;
            info!(proforma = proforma.number(), gross = %proforma.gross(), "proforma created");
            books.proformas.upsert(id, proforma);
            Ok(id)
        })
    }

    /// Issue the final invoice for a proforma. Linked order elements are
    /// invoiced only now; the proforma itself never counts towards them.
    pub fn convert_proforma(
        &self,
        proforma_id: ProformaId,
        issued_on: NaiveDate,
    ) -> OfficeResult<InvoiceId> {
        let due_on = self.due_date(issued_on);
        self.transact("convert_proforma", |books, now| {
            let (person_id, currency) = {
                let proforma = books.proformas.require(&proforma_id, "proforma")?;
                (proforma.header().person_id, proforma.header().currency.clone())
            };
            let header = new_header(
                books,
                DocumentKind::Invoice,
                person_id,
                currency,
                issued_on,
                now,
            )?;
            let invoice_id = InvoiceId::new();
            let invoice = books
                .proformas
                .require_mut(&proforma_id, "proforma")?
                .convert(invoice_id, header, issued_on, due_on, now)?;
            info!(invoice = invoice.number(), gross = %invoice.gross(), "proforma converted");
            books.invoices.upsert(invoice_id, invoice);
            after_invoice_change(books, invoice_id, BTreeSet::new())?;
            Ok(invoice_id)
        })
    }

    pub fn cancel_proforma(&self, proforma_id: ProformaId) -> OfficeResult<()> {
        self.transact("cancel_proforma", |books, now| {
            books.proformas.require_mut(&proforma_id, "proforma")?.cancel(now)?;
            Ok(())
        })
    }
}

/// An element on an open proforma must stay billable until the proforma is
/// converted or cancelled.
fn ensure_not_on_proforma(
    books: &Books,
    order_id: OrderId,
    element_id: OrderElementId,
) -> OfficeResult<()> {
    let target = Some(OrderLink { order_id, element_id });
    let pending = books
        .proformas
        .values()
        .filter(|p| !p.is_cancelled() && p.converted_to().is_none())
        .find(|p| {
            p.elements()
                .iter()
                .any(|e| !e.line.cancelled && e.order_link == target)
        });
    match pending {
        Some(proforma) => Err(DomainError::invariant(format!(
            "order element is on open proforma {}",
            proforma.number()
        ))
        .into()),
        None => Ok(()),
    }
}

fn ensure_not_linked(
    books: &Books,
    order_id: OrderId,
    element_id: OrderElementId,
) -> OfficeResult<()> {
    let target = OrderLink { order_id, element_id };
    let on_invoice = books
        .invoices
        .values()
        .any(|i| i.order_links().any(|l| l == target));
    let on_proforma = books
        .proformas
        .values()
        .any(|p| p.elements().iter().any(|e| e.order_link == Some(target)));
    if on_invoice || on_proforma {
        return Err(DomainError::invariant(
            "order element is referenced by an invoice or proforma; cancel it instead",
        )
        .into());
    }
    Ok(())
}
