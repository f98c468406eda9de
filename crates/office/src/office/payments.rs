use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use brokerdesk_catalog::Currency;
use brokerdesk_core::{DomainError, PaymentId, PersonId, ReceiptId};
use brokerdesk_documents::{DocumentKind, Payment, PaymentMethod, Receipt};

use super::Office;
use crate::allocation::{self, Allocation};
use crate::error::OfficeResult;
use crate::reconcile::after_payment_change;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterPayment {
    pub person_id: PersonId,
    pub method: PaymentMethod,
    pub currency: Option<Currency>,
    pub paid_on: NaiveDate,
    pub amount: Decimal,
    pub allocation: Allocation,
    pub note: Option<String>,
}

impl Office {
    /// Register a payment and allocate it; see [`crate::allocation`] for the rules.
    pub fn register_payment(&self, cmd: RegisterPayment) -> OfficeResult<PaymentId> {
        let currency = cmd.currency.unwrap_or_else(|| self.settings().currency.clone());
        self.transact("register_payment", |books, now| {
            books.person(cmd.person_id)?;
            let planned = allocation::plan(
                books,
                cmd.person_id,
                &currency,
                cmd.amount,
                &cmd.allocation,
            );
            let planned = match planned {
                Ok(planned) => planned,
                Err(err) => {
                    warn!(
                        person_id = %cmd.person_id,
                        amount = %cmd.amount,
                        error = %err,
                        "payment rejected"
                    );
                    return Err(err);
                }
            };

            let id = PaymentId::new();
            let mut payment = Payment::register(
                id,
                cmd.person_id,
                cmd.method,
                currency,
                cmd.paid_on,
                cmd.amount,
                planned,
                now,
            )?;
            if let Some(note) = cmd.note {
                payment = payment.with_note(note);
            }
            let invoices: Vec<_> = payment.invoice_ids().collect();
            info!(
                payment_id = %id,
                amount = %payment.amount(),
                invoices = invoices.len(),
                "payment registered"
            );
            books.payments.upsert(id, payment);
            after_payment_change(books, invoices)?;
            Ok(id)
        })
    }

    /// Cancel a payment with a negated mirror; its invoices are open again.
    pub fn storno_payment(
        &self,
        payment_id: PaymentId,
        paid_on: NaiveDate,
    ) -> OfficeResult<PaymentId> {
        self.transact("storno_payment", |books, now| {
            if paid_on < books.payment(payment_id)?.paid_on() {
                return Err(DomainError::validation(
                    "storno cannot precede the payment it cancels",
                )
                .into());
            }
            let storno_id = PaymentId::new();
            let storno = Payment::storno(books.payment(payment_id)?, storno_id, paid_on, now)?;
            books
                .payments
                .require_mut(&payment_id, "payment")?
                .mark_cancelled_by(storno_id, now)?;
            let invoices: Vec<_> = storno.invoice_ids().collect();
            info!(payment_id = %storno_id, cancels = %payment_id, "payment storno registered");
            books.payments.upsert(storno_id, storno);
            after_payment_change(books, invoices)?;
            Ok(storno_id)
        })
    }

    /// Issue the cash receipt (KP) for a payment; one receipt per payment.
    pub fn issue_receipt(
        &self,
        payment_id: PaymentId,
        issued_on: NaiveDate,
    ) -> OfficeResult<ReceiptId> {
        self.transact("issue_receipt", |books, now| {
            if let Some(existing) = books.receipt_for(payment_id) {
                return Err(DomainError::conflict(format!(
                    "payment already has receipt {}",
                    existing.number()
                ))
                .into());
            }
            let number = books.serials.issue(DocumentKind::Receipt, issued_on)?;
            let id = ReceiptId::new();
            let receipt = Receipt::issue(id, number, books.payment(payment_id)?, issued_on, now)?;
            info!(receipt = receipt.number(), amount = %receipt.amount(), "receipt issued");
            books.receipts.upsert(id, receipt);
            Ok(id)
        })
    }
}
