//! Application service: the single entry point for reading and changing the books.

mod calendar;
mod documents;
mod invoicing;
mod maintenance;
mod parties;
mod payments;
mod queries;

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, info_span, warn};

use brokerdesk_catalog::Currency;
use brokerdesk_core::{DomainError, ExpectedVersion, PersonId, VatRate, Versioned};
use brokerdesk_documents::{DocumentKind, Header};

use crate::books::Books;
use crate::error::OfficeResult;

pub use documents::{CreateOffer, CreateOrder, CreateProforma};
pub use invoicing::{DraftElement, IssueInvoice};
pub use payments::RegisterPayment;

/// Defaults applied when a command leaves a value out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeSettings {
    pub currency: Currency,
    /// Days between issue date and due date.
    pub payment_days: u32,
    pub vat_rate: VatRate,
}

impl Default for OfficeSettings {
    fn default() -> Self {
        Self {
            currency: Currency::pln(),
            payment_days: 14,
            vat_rate: VatRate::default(),
        }
    }
}

/// The office: committed books behind a lock, plus settings.
///
/// Writers are serialized by the lock; each write runs as a transaction on a
/// copy of the books (see the crate docs).
#[derive(Debug)]
pub struct Office {
    books: RwLock<Books>,
    settings: OfficeSettings,
}

impl Office {
    pub fn new(settings: OfficeSettings) -> Self {
        Self::with_books(Books::new(), settings)
    }

    pub fn with_books(books: Books, settings: OfficeSettings) -> Self {
        Self {
            books: RwLock::new(books),
            settings,
        }
    }

    pub fn settings(&self) -> &OfficeSettings {
        &self.settings
    }

    /// Run `f` against the committed books.
    pub fn read<T>(&self, f: impl FnOnce(&Books) -> T) -> OfficeResult<T> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&books))
    }

    /// Copy of the committed books (for snapshots and reports).
    pub fn snapshot(&self) -> OfficeResult<Books> {
        self.read(Books::clone)
    }

    /// Run `f` as a transaction: on `Ok` its changes are committed, on `Err`
    /// every change it made is discarded.
    pub(crate) fn transact<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Books, DateTime<Utc>) -> OfficeResult<T>,
    ) -> OfficeResult<T> {
        let span = info_span!("transaction", operation);
        let _enter = span.enter();

        // A panicking operation only ever touched its draft, so the
        // committed books behind a poisoned lock are still whole.
        let mut committed = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let mut draft = committed.clone();
        match f(&mut draft, Utc::now()) {
            Ok(value) => {
                *committed = draft;
                info!("committed");
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "rolled back");
                Err(err)
            }
        }
    }

    pub(crate) fn due_date(&self, issued_on: NaiveDate) -> NaiveDate {
        issued_on + chrono::Days::new(u64::from(self.settings.payment_days))
    }
}

/// Header for a new document, numbered from the document kind's serial.
pub(crate) fn new_header(
    books: &mut Books,
    kind: DocumentKind,
    person_id: PersonId,
    currency: Currency,
    issued_on: NaiveDate,
    now: DateTime<Utc>,
) -> OfficeResult<Header> {
    ensure_can_transact(books, person_id)?;
    let number = books.serials.issue(kind, issued_on)?;
    Ok(Header::new(number, person_id, currency, issued_on, now))
}

pub(crate) fn ensure_can_transact(books: &Books, person_id: PersonId) -> OfficeResult<()> {
    let person = books.person(person_id)?;
    if !person.can_transact() {
        return Err(DomainError::invariant(format!(
            "{} is inactive and cannot appear on new documents",
            person.name()
        ))
        .into());
    }
    Ok(())
}

pub(crate) fn check_version(
    record: &impl Versioned,
    expected: ExpectedVersion,
) -> OfficeResult<()> {
    expected.check(record.version())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_parties::NewPerson;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn panicking_operation_leaves_the_office_usable() {
        let office = Office::new(OfficeSettings::default());
        let kept = office.register_person(NewPerson::client("Jan Kowalski")).unwrap();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            office.transact("explode", |books, _| -> OfficeResult<()> {
                books.persons.remove(&kept);
                panic!("operation failed midway");
            })
        }));
        assert!(outcome.is_err());

        assert!(office.read(|b| b.person(kept).is_ok()).unwrap());
        office.register_person(NewPerson::client("Anna Nowak")).unwrap();
        assert_eq!(office.read(|b| b.persons.len()).unwrap(), 2);
    }
}
