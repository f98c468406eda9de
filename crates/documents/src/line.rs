use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    Amounts, DomainError, DomainResult, ServiceId, VatRate, checked_line_total, line_total,
};

/// A billable line: shared shape of offer, order, proforma and invoice elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub description: String,
    pub service_id: Option<ServiceId>,
    pub quantity: Decimal,
    /// Net unit price.
    pub price: Decimal,
    pub vat_rate: VatRate,
    /// Soft-cancelled lines stay on the document but count for nothing.
    #[serde(default)]
    pub cancelled: bool,
}

impl Line {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        vat_rate: VatRate,
    ) -> DomainResult<Self> {
        let line = Self {
            description: description.into().trim().to_string(),
            service_id: None,
            quantity,
            price,
            vat_rate,
            cancelled: false,
        };
        line.validate()?;
        Ok(line)
    }

    pub fn with_service(mut self, service_id: ServiceId) -> Self {
        self.service_id = Some(service_id);
        self
    }

    /// Rules for lines entered by hand. Storno lines are built by negation and
    /// skip the positive-quantity rule.
    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("line description cannot be empty"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::validation("line quantity must be positive"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("line price cannot be negative"));
        }
        checked_line_total(self.price, self.quantity)?;
        Ok(())
    }

    /// Net total, `price × quantity`.
    pub fn total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }

    /// Net total, or zero for a cancelled line.
    pub fn effective_total(&self) -> Decimal {
        if self.cancelled { Decimal::ZERO } else { self.total() }
    }

    pub fn amounts(&self) -> Amounts {
        Amounts::from_net(self.total(), self.vat_rate)
    }

    /// Mirror image used by storno documents.
    pub fn negated(&self) -> Self {
        Self {
            quantity: -self.quantity,
            cancelled: false,
            ..self.clone()
        }
    }
}
