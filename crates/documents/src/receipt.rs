use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    DomainError, DomainResult, Entity, PaymentId, PersonId, ReceiptId, Timestamps,
};

use crate::payment::{Payment, PaymentMethod};

/// Cash receipt ("KP") confirming a cash payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    id: ReceiptId,
    number: String,
    payment_id: PaymentId,
    person_id: PersonId,
    amount: Decimal,
    issued_on: NaiveDate,
    timestamps: Timestamps,
}

impl Receipt {
    pub fn issue(
        id: ReceiptId,
        number: impl Into<String>,
        payment: &Payment,
        issued_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if payment.method() != PaymentMethod::Cash {
            return Err(DomainError::invariant("receipts are issued for cash payments only"));
        }
        if payment.is_storno() || payment.is_cancelled() {
            return Err(DomainError::invariant("cannot issue a receipt for a cancelled payment"));
        }
        if issued_on < payment.paid_on() {
            return Err(DomainError::validation("receipt cannot precede the payment"));
        }
        Ok(Self {
            id,
            number: number.into(),
            payment_id: payment.id(),
            person_id: payment.person_id(),
            amount: payment.amount(),
            issued_on,
            timestamps: Timestamps::new(now),
        })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn payment_id(&self) -> PaymentId {
        self.payment_id
    }

    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }
}

impl Entity for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> ReceiptId {
        self.id
    }
}
