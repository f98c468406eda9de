use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    DomainError, DomainResult, Entity, InvoiceElementId, InvoiceId, OrderElementId, OrderId,
    ProformaId, Versioned,
};

use crate::header::Header;
use crate::line::Line;
use crate::totals::DocumentTotals;

/// Regular invoice or its storno (correction to zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    Regular,
    Storno,
}

/// Pointer from an invoice/proforma element to the order element it bills.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLink {
    pub order_id: OrderId,
    pub element_id: OrderElementId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceElement {
    id: InvoiceElementId,
    line: Line,
    order_link: Option<OrderLink>,
}

impl InvoiceElement {
    pub fn new(
        id: InvoiceElementId,
        line: Line,
        order_link: Option<OrderLink>,
    ) -> DomainResult<Self> {
        line.validate()?;
        Ok(Self {
            id,
            line,
            order_link,
        })
    }

    pub fn id(&self) -> InvoiceElementId {
        self.id
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn order_link(&self) -> Option<OrderLink> {
        self.order_link
    }

    /// Net total counted towards the invoice and the linked order element.
    pub fn total(&self) -> Decimal {
        self.line.effective_total()
    }

    pub fn is_cancelled(&self) -> bool {
        self.line.cancelled
    }
}

/// Input for issuing a regular invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub header: Header,
    pub sale_date: NaiveDate,
    pub due_on: NaiveDate,
    pub elements: Vec<InvoiceElement>,
    pub proforma_id: Option<ProformaId>,
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    header: Header,
    kind: InvoiceKind,
    sale_date: NaiveDate,
    due_on: NaiveDate,
    elements: Vec<InvoiceElement>,
    /// Cached net Σ(price × quantity) of non-cancelled elements.
    value: Decimal,
    /// Cached VAT.
    vat: Decimal,
    /// Cached gross.
    gross: Decimal,
    /// Cached Σ of payment elements allocated to this invoice.
    payed: Decimal,
    /// Storno → the invoice it cancels.
    cancellation_to: Option<InvoiceId>,
    /// Original → the storno that cancelled it.
    cancelled_from: Option<InvoiceId>,
    proforma_id: Option<ProformaId>,
    version: u64,
}

impl Invoice {
    pub fn issue(id: InvoiceId, input: NewInvoice) -> DomainResult<Self> {
        if input.elements.is_empty() {
            return Err(DomainError::validation("cannot issue invoice without elements"));
        }
        if input.due_on < input.header.issued_on {
            return Err(DomainError::validation("due date cannot precede the issue date"));
        }

        let mut invoice = Self {
            id,
            header: input.header,
            kind: InvoiceKind::Regular,
            sale_date: input.sale_date,
            due_on: input.due_on,
            elements: input.elements,
            value: Decimal::ZERO,
            vat: Decimal::ZERO,
            gross: Decimal::ZERO,
            payed: Decimal::ZERO,
            cancellation_to: None,
            cancelled_from: None,
            proforma_id: input.proforma_id,
            version: 1,
        };
        invoice.recompute_totals();
        Ok(invoice)
    }

    /// Build the storno of `original`: every non-cancelled element mirrored
    /// with negated quantity, linked to the same order elements.
    ///
    /// The original is not modified here; see [`Invoice::mark_cancelled_by`].
    pub fn storno(original: &Invoice, id: InvoiceId, header: Header) -> DomainResult<Self> {
        original.ensure_cancellable()?;

        let elements = original
            .elements
            .iter()
            .filter(|e| !e.is_cancelled())
            .map(|e| InvoiceElement {
                id: InvoiceElementId::new(),
                line: e.line.negated(),
                order_link: e.order_link,
            })
            .collect();

        let mut storno = Self {
            id,
            sale_date: original.sale_date,
            due_on: header.issued_on,
            header,
            kind: InvoiceKind::Storno,
            elements,
            value: Decimal::ZERO,
            vat: Decimal::ZERO,
            gross: Decimal::ZERO,
            payed: Decimal::ZERO,
            cancellation_to: Some(original.id),
            cancelled_from: None,
            proforma_id: None,
            version: 1,
        };
        storno.recompute_totals();
        Ok(storno)
    }

    pub fn mark_cancelled_by(
        &mut self,
        storno_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_cancellable()?;
        self.cancelled_from = Some(storno_id);
        self.bump(now);
        Ok(())
    }

    fn ensure_cancellable(&self) -> DomainResult<()> {
        if self.kind == InvoiceKind::Storno {
            return Err(DomainError::invariant("a storno invoice cannot be cancelled"));
        }
        if self.cancelled_from.is_some() {
            return Err(DomainError::conflict("invoice is already cancelled"));
        }
        if !self.payed.is_zero() {
            return Err(DomainError::invariant(
                "cannot cancel an invoice with allocated payments",
            ));
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn number(&self) -> &str {
        &self.header.number
    }

    pub fn kind(&self) -> InvoiceKind {
        self.kind
    }

    pub fn sale_date(&self) -> NaiveDate {
        self.sale_date
    }

    pub fn due_on(&self) -> NaiveDate {
        self.due_on
    }

    pub fn elements(&self) -> &[InvoiceElement] {
        &self.elements
    }

    pub fn element(&self, id: InvoiceElementId) -> Option<&InvoiceElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn vat(&self) -> Decimal {
        self.vat
    }

    pub fn gross(&self) -> Decimal {
        self.gross
    }

    pub fn payed(&self) -> Decimal {
        self.payed
    }

    pub fn outstanding(&self) -> Decimal {
        self.gross - self.payed
    }

    pub fn cancellation_to(&self) -> Option<InvoiceId> {
        self.cancellation_to
    }

    pub fn cancelled_from(&self) -> Option<InvoiceId> {
        self.cancelled_from
    }

    pub fn proforma_id(&self) -> Option<ProformaId> {
        self.proforma_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_from.is_some()
    }

    pub fn is_storno(&self) -> bool {
        self.kind == InvoiceKind::Storno
    }

    pub fn is_settled(&self) -> bool {
        self.outstanding() <= Decimal::ZERO
    }

    /// Whether a payment may still be allocated to this invoice.
    pub fn can_accept_payment(&self) -> bool {
        self.kind == InvoiceKind::Regular && !self.is_cancelled() && !self.is_settled()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.can_accept_payment() && today > self.due_on
    }

    /// Order links of all elements, cancelled ones included.
    pub fn order_links(&self) -> impl Iterator<Item = OrderLink> + '_ {
        self.elements.iter().filter_map(|e| e.order_link)
    }

    pub fn totals(&self) -> DocumentTotals {
        DocumentTotals::from_lines(self.elements.iter().map(|e| &e.line))
    }

    pub fn add_element(&mut self, element: InvoiceElement, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;
        if self.element(element.id).is_some() {
            return Err(DomainError::conflict("invoice element already exists"));
        }
        self.elements.push(element);
        self.recompute_totals();
        self.bump(now);
        Ok(())
    }

    pub fn update_element(
        &mut self,
        id: InvoiceElementId,
        line: Line,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_editable()?;
        line.validate()?;
        let element = self.element_mut(id)?;
        if element.line.cancelled {
            return Err(DomainError::conflict("invoice element is cancelled"));
        }
        element.line = line;
        self.recompute_totals();
        self.bump(now);
        Ok(())
    }

    pub fn cancel_element(&mut self, id: InvoiceElementId, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_editable()?;
        let element = self.element_mut(id)?;
        if element.line.cancelled {
            return Err(DomainError::conflict("invoice element is already cancelled"));
        }
        element.line.cancelled = true;
        self.recompute_totals();
        self.bump(now);
        Ok(())
    }

    pub fn set_due_on(&mut self, due_on: NaiveDate, now: DateTime<Utc>) -> DomainResult<()> {
        if due_on < self.header.issued_on {
            return Err(DomainError::validation("due date cannot precede the issue date"));
        }
        self.due_on = due_on;
        self.bump(now);
        Ok(())
    }

    /// Recompute value/VAT/gross from the elements. Returns `true` when any
    /// cached field changed.
    pub fn recompute_totals(&mut self) -> bool {
        let totals = self.totals();
        let changed =
            totals.net() != self.value || totals.vat() != self.vat || totals.gross() != self.gross;
        self.value = totals.net();
        self.vat = totals.vat();
        self.gross = totals.gross();
        changed
    }

    /// Store a freshly computed payed amount. Returns `true` when it changed.
    pub fn apply_payed(&mut self, payed: Decimal) -> bool {
        let changed = payed != self.payed;
        self.payed = payed;
        changed
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.kind == InvoiceKind::Storno {
            return Err(DomainError::invariant("storno invoices cannot be edited"));
        }
        if self.is_cancelled() {
            return Err(DomainError::invariant("cancelled invoices cannot be edited"));
        }
        if !self.payed.is_zero() {
            return Err(DomainError::invariant(
                "invoices with allocated payments cannot be edited",
            ));
        }
        Ok(())
    }

    fn element_mut(&mut self, id: InvoiceElementId) -> DomainResult<&mut InvoiceElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DomainError::invalid_id(format!("invoice has no element {id}")))
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.header.timestamps.touch(now);
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> InvoiceId {
        self.id
    }
}

impl Versioned for Invoice {
    fn version(&self) -> u64 {
        self.version
    }
}
