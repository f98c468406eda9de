use tracing::{info, warn};

use super::Office;
use crate::audit::{self, Discrepancy};
use crate::error::OfficeResult;
use crate::reconcile::{self, RepairSummary};

impl Office {
    /// Rebuild every cached value from source rows and commit the result.
    pub fn recompute_all(&self) -> OfficeResult<RepairSummary> {
        self.transact("recompute_all", |books, _| {
            let summary = reconcile::recompute_all(books);
            info!(
                orders = summary.orders,
                invoices = summary.invoices,
                proformas = summary.proformas,
                offers = summary.offers,
                "caches recomputed"
            );
            Ok(summary)
        })
    }

    /// Cached values that differ from their recomputed value. Changes nothing.
    pub fn audit(&self) -> OfficeResult<Vec<Discrepancy>> {
        let findings = self.read(audit::audit)?;
        for finding in &findings {
            warn!(
                kind = ?finding.kind,
                number = %finding.number,
                field = finding.field,
                cached = %finding.cached,
                expected = %finding.expected,
                "stale cached value"
            );
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use crate::books::Books;
    use crate::office::{DraftElement, IssueInvoice, Office, OfficeSettings};
    use brokerdesk_core::VatRate;
    use brokerdesk_documents::Line;
    use brokerdesk_parties::NewPerson;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    /// Books whose invoice lost its cached totals, as after a hand edit.
    fn stale_books() -> Books {
        let office = Office::new(OfficeSettings::default());
        let client = office.register_person(NewPerson::client("Maria Kowalczyk")).unwrap();
        let id = office
            .issue_invoice(IssueInvoice {
                person_id: client,
                currency: None,
                issued_on: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                sale_date: None,
                due_on: None,
                elements: vec![DraftElement::Line(
                    Line::new("Tłumaczenie", dec!(1), dec!(100), VatRate::default()).unwrap(),
                )],
            })
            .unwrap();
        let mut books = office.snapshot().unwrap();
        books.invoice_mut(id).unwrap().apply_payed(dec!(5));
        books
    }

    #[test]
    fn repair_clears_audit_findings() {
        let office = Office::with_books(stale_books(), OfficeSettings::default());
        assert_eq!(office.audit().unwrap().len(), 1);

        let summary = office.recompute_all().unwrap();
        assert_eq!(summary.invoices, 1);
        assert!(office.audit().unwrap().is_empty());
        assert_eq!(office.recompute_all().unwrap().total(), 0);
    }
}
