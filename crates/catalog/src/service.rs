use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{DomainError, DomainResult, Entity, ServiceId, VatRate};

/// Billable service from the price list (e.g. "sworn translation EN→PL").
///
/// Used to pre-fill document lines; lines keep their own copy of the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    id: ServiceId,
    name: String,
    unit: String,
    default_price: Decimal,
    vat_rate: VatRate,
    active: bool,
}

impl Service {
    pub fn new(
        id: ServiceId,
        name: impl Into<String>,
        unit: impl Into<String>,
        default_price: Decimal,
        vat_rate: VatRate,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("service name cannot be empty"));
        }
        if default_price.is_sign_negative() {
            return Err(DomainError::validation("service price cannot be negative"));
        }
        Ok(Self {
            id,
            name,
            unit: unit.into(),
            default_price,
            vat_rate,
            active: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn default_price(&self) -> Decimal {
        self.default_price
    }

    pub fn vat_rate(&self) -> VatRate {
        self.vat_rate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_price(&mut self, price: Decimal) -> DomainResult<()> {
        if price.is_sign_negative() {
            return Err(DomainError::validation("service price cannot be negative"));
        }
        self.default_price = price;
        Ok(())
    }

    pub fn archive(&mut self) {
        self.active = false;
    }
}

impl Entity for Service {
    type Id = ServiceId;

    fn id(&self) -> ServiceId {
        self.id
    }
}
