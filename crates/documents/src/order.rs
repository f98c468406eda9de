use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    DomainError, DomainResult, Entity, OfferId, OrderElementId, OrderId, StatusId, Versioned,
};

use crate::header::Header;
use crate::line::Line;

/// Billable line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderElement {
    id: OrderElementId,
    line: Line,
    /// Cached: net total of non-cancelled invoice elements linked here.
    invoiced: Decimal,
}

impl OrderElement {
    pub fn new(id: OrderElementId, line: Line) -> DomainResult<Self> {
        line.validate()?;
        Ok(Self {
            id,
            line,
            invoiced: Decimal::ZERO,
        })
    }

    pub fn id(&self) -> OrderElementId {
        self.id
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn total(&self) -> Decimal {
        self.line.effective_total()
    }

    pub fn invoiced(&self) -> Decimal {
        self.invoiced
    }

    /// Net amount still to be invoiced (never negative).
    pub fn remaining(&self) -> Decimal {
        (self.total() - self.invoiced).max(Decimal::ZERO)
    }

    pub fn is_cancelled(&self) -> bool {
        self.line.cancelled
    }
}

/// Aggregate root: Order (a commissioned job with its billable elements).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    header: Header,
    status_id: Option<StatusId>,
    description: String,
    deadline: Option<NaiveDate>,
    offer_id: Option<OfferId>,
    elements: Vec<OrderElement>,
    /// Cached: Σ non-cancelled element totals.
    value: Decimal,
    /// Cached: Σ element `invoiced`.
    invoiced: Decimal,
    version: u64,
}

impl Order {
    pub fn new(id: OrderId, header: Header, description: impl Into<String>) -> Self {
        Self {
            id,
            header,
            status_id: None,
            description: description.into(),
            deadline: None,
            offer_id: None,
            elements: Vec::new(),
            value: Decimal::ZERO,
            invoiced: Decimal::ZERO,
            version: 1,
        }
    }

    pub fn from_offer(mut self, offer_id: OfferId) -> Self {
        self.offer_id = Some(offer_id);
        self
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn number(&self) -> &str {
        &self.header.number
    }

    pub fn status_id(&self) -> Option<StatusId> {
        self.status_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    pub fn offer_id(&self) -> Option<OfferId> {
        self.offer_id
    }

    pub fn elements(&self) -> &[OrderElement] {
        &self.elements
    }

    pub fn element(&self, id: OrderElementId) -> Option<&OrderElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn invoiced(&self) -> Decimal {
        self.invoiced
    }

    /// Net amount still to be invoiced.
    pub fn remaining(&self) -> Decimal {
        self.value - self.invoiced
    }

    pub fn set_status(&mut self, status_id: Option<StatusId>, now: DateTime<Utc>) {
        self.status_id = status_id;
        self.bump(now);
    }

    pub fn set_deadline(
        &mut self,
        deadline: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if let Some(d) = deadline {
            if d < self.header.issued_on {
                return Err(DomainError::validation("deadline cannot precede the order date"));
            }
        }
        self.deadline = deadline;
        self.bump(now);
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>, now: DateTime<Utc>) {
        self.description = description.into();
        self.bump(now);
    }

    pub fn add_element(&mut self, element: OrderElement, now: DateTime<Utc>) -> DomainResult<()> {
        if self.element(element.id).is_some() {
            return Err(DomainError::conflict("order element already exists"));
        }
        self.elements.push(element);
        self.recompute_value();
        self.bump(now);
        Ok(())
    }

    /// Replace an element's line. The new total cannot drop below what has
    /// already been invoiced against it.
    pub fn update_element(
        &mut self,
        id: OrderElementId,
        line: Line,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        line.validate()?;
        let element = self.element_mut(id)?;
        if line.total() < element.invoiced {
            return Err(DomainError::invariant(format!(
                "element total {} is below the invoiced amount {}",
                line.total(),
                element.invoiced
            )));
        }
        let cancelled = element.line.cancelled;
        element.line = Line { cancelled, ..line };
        self.recompute_value();
        self.bump(now);
        Ok(())
    }

    /// Soft-cancel an element; invoiced elements must be credited first.
    pub fn cancel_element(&mut self, id: OrderElementId, now: DateTime<Utc>) -> DomainResult<()> {
        let element = self.element_mut(id)?;
        if element.line.cancelled {
            return Err(DomainError::conflict("order element is already cancelled"));
        }
        if !element.invoiced.is_zero() {
            return Err(DomainError::invariant(
                "cannot cancel an order element that has been invoiced",
            ));
        }
        element.line.cancelled = true;
        self.recompute_value();
        self.bump(now);
        Ok(())
    }

    pub fn remove_element(
        &mut self,
        id: OrderElementId,
        now: DateTime<Utc>,
    ) -> DomainResult<OrderElement> {
        let pos = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| DomainError::invalid_id(format!("order has no element {id}")))?;
        if !self.elements[pos].invoiced.is_zero() {
            return Err(DomainError::invariant(
                "cannot remove an order element that has been invoiced",
            ));
        }
        let removed = self.elements.remove(pos);
        self.recompute_value();
        self.bump(now);
        Ok(removed)
    }

    /// Recompute the cached value. Returns `true` when it changed.
    pub fn recompute_value(&mut self) -> bool {
        let value: Decimal = self.elements.iter().map(OrderElement::total).sum();
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Store freshly computed invoiced amounts. Elements missing from the map
    /// have nothing invoiced. Returns `true` when any cache changed.
    pub fn apply_invoiced(&mut self, per_element: &HashMap<OrderElementId, Decimal>) -> bool {
        let mut changed = false;
        for element in &mut self.elements {
            let invoiced = per_element.get(&element.id).copied().unwrap_or(Decimal::ZERO);
            if invoiced != element.invoiced {
                element.invoiced = invoiced;
                changed = true;
            }
        }
        let total: Decimal = self.elements.iter().map(|e| e.invoiced).sum();
        if total != self.invoiced {
            self.invoiced = total;
            changed = true;
        }
        changed
    }

    fn element_mut(&mut self, id: OrderElementId) -> DomainResult<&mut OrderElement> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DomainError::invalid_id(format!("order has no element {id}")))
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.header.timestamps.touch(now);
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl Versioned for Order {
    fn version(&self) -> u64 {
        self.version
    }
}
