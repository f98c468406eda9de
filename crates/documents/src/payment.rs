use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_catalog::Currency;
use brokerdesk_core::{
    DomainError, DomainResult, Entity, InvoiceId, PaymentElementId, PaymentId, PersonId,
    Timestamps, Versioned,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Regular,
    Storno,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
}

/// Part of a payment allocated to one invoice (gross).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentElement {
    pub id: PaymentElementId,
    pub invoice_id: InvoiceId,
    pub value: Decimal,
}

/// Money received from a client, allocated to one or more invoices.
///
/// Invariant: the element values sum to `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    person_id: PersonId,
    kind: PaymentKind,
    method: PaymentMethod,
    currency: Currency,
    paid_on: NaiveDate,
    amount: Decimal,
    elements: Vec<PaymentElement>,
    note: Option<String>,
    cancellation_to: Option<PaymentId>,
    cancelled_from: Option<PaymentId>,
    timestamps: Timestamps,
    version: u64,
}

impl Payment {
    /// Build a regular payment from already-decided allocations.
    ///
    /// Deciding *how* to allocate (and checking it against the invoices) is
    /// done by the caller; this only checks the payment's own invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        id: PaymentId,
        person_id: PersonId,
        method: PaymentMethod,
        currency: Currency,
        paid_on: NaiveDate,
        amount: Decimal,
        allocations: Vec<(InvoiceId, Decimal)>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        if allocations.is_empty() {
            return Err(DomainError::validation("payment must be allocated to an invoice"));
        }
        let mut seen = HashSet::new();
        for (invoice_id, value) in &allocations {
            if !seen.insert(*invoice_id) {
                return Err(DomainError::validation(format!(
                    "invoice {invoice_id} is listed twice"
                )));
            }
            if *value <= Decimal::ZERO {
                return Err(DomainError::validation("allocated value must be positive"));
            }
        }
        let allocated: Decimal = allocations.iter().map(|(_, v)| *v).sum();
        if allocated != amount {
            return Err(DomainError::invariant(format!(
                "allocations sum to {allocated}, payment amount is {amount}"
            )));
        }

        Ok(Self {
            id,
            person_id,
            kind: PaymentKind::Regular,
            method,
            currency,
            paid_on,
            amount,
            elements: allocations
                .into_iter()
                .map(|(invoice_id, value)| PaymentElement {
                    id: PaymentElementId::new(),
                    invoice_id,
                    value,
                })
                .collect(),
            note: None,
            cancellation_to: None,
            cancelled_from: None,
            timestamps: Timestamps::new(now),
            version: 1,
        })
    }

    /// Mirror of `original` with negated values; undoes its allocations.
    pub fn storno(
        original: &Payment,
        id: PaymentId,
        paid_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        original.ensure_cancellable()?;
        Ok(Self {
            id,
            person_id: original.person_id,
            kind: PaymentKind::Storno,
            method: original.method,
            currency: original.currency.clone(),
            paid_on,
            amount: -original.amount,
            elements: original
                .elements
                .iter()
                .map(|e| PaymentElement {
                    id: PaymentElementId::new(),
                    invoice_id: e.invoice_id,
                    value: -e.value,
                })
                .collect(),
            note: None,
            cancellation_to: Some(original.id),
            cancelled_from: None,
            timestamps: Timestamps::new(now),
            version: 1,
        })
    }

    pub fn mark_cancelled_by(
        &mut self,
        storno_id: PaymentId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_cancellable()?;
        self.cancelled_from = Some(storno_id);
        self.version += 1;
        self.timestamps.touch(now);
        Ok(())
    }

    fn ensure_cancellable(&self) -> DomainResult<()> {
        if self.kind == PaymentKind::Storno {
            return Err(DomainError::invariant("a storno payment cannot be cancelled"));
        }
        if self.cancelled_from.is_some() {
            return Err(DomainError::conflict("payment is already cancelled"));
        }
        Ok(())
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn kind(&self) -> PaymentKind {
        self.kind
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn paid_on(&self) -> NaiveDate {
        self.paid_on
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn elements(&self) -> &[PaymentElement] {
        &self.elements
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn cancellation_to(&self) -> Option<PaymentId> {
        self.cancellation_to
    }

    pub fn cancelled_from(&self) -> Option<PaymentId> {
        self.cancelled_from
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_from.is_some()
    }

    pub fn is_storno(&self) -> bool {
        self.kind == PaymentKind::Storno
    }

    pub fn invoice_ids(&self) -> impl Iterator<Item = InvoiceId> + '_ {
        self.elements.iter().map(|e| e.invoice_id)
    }

    /// Value allocated to `invoice_id` by this payment.
    pub fn allocated_to(&self, invoice_id: InvoiceId) -> Decimal {
        self.elements
            .iter()
            .filter(|e| e.invoice_id == invoice_id)
            .map(|e| e.value)
            .sum()
    }
}

impl Entity for Payment {
    type Id = PaymentId;

    fn id(&self) -> PaymentId {
        self.id
    }
}

impl Versioned for Payment {
    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn pay(amount: Decimal, allocations: Vec<(InvoiceId, Decimal)>) -> DomainResult<Payment> {
        Payment::register(
            PaymentId::new(),
            PersonId::new(),
            PaymentMethod::Transfer,
            Currency::pln(),
            today(),
            amount,
            allocations,
            Utc::now(),
        )
    }

    #[test]
    fn allocations_must_sum_to_amount() {
        let err = pay(dec!(100), vec![(InvoiceId::new(), dec!(60)), (InvoiceId::new(), dec!(30))])
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("allocations sum to 90") => {}
            _ => panic!("Expected InvariantViolation for unbalanced allocation"),
        }
    }

    #[test]
    fn duplicate_invoice_is_rejected() {
        let id = InvoiceId::new();
        assert!(pay(dec!(100), vec![(id, dec!(50)), (id, dec!(50))]).is_err());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        assert!(pay(dec!(0), vec![(InvoiceId::new(), dec!(0))]).is_err());
    }

    #[test]
    fn storno_negates_every_element() {
        let inv = InvoiceId::new();
        let mut original = pay(dec!(150), vec![(inv, dec!(150))]).unwrap();
        let storno = Payment::storno(&original, PaymentId::new(), today(), Utc::now()).unwrap();
        original.mark_cancelled_by(storno.id(), Utc::now()).unwrap();

        assert_eq!(storno.amount(), dec!(-150));
        assert_eq!(storno.allocated_to(inv), dec!(-150));
        assert_eq!(storno.cancellation_to(), Some(original.id()));
        assert!(original.is_cancelled());
        assert!(Payment::storno(&original, PaymentId::new(), today(), Utc::now()).is_err());
        assert!(Payment::storno(&storno, PaymentId::new(), today(), Utc::now()).is_err());
    }
}
