//! Read-only consistency check of the cached document values.

use rust_decimal::Decimal;
use serde::Serialize;

use brokerdesk_core::Entity;

use crate::books::Books;
use crate::reconcile::recompute_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Offer,
    Order,
    OrderElement,
    Proforma,
    Invoice,
}

/// A cached field that differs from the value recomputed from source rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub kind: RecordKind,
    pub id: String,
    /// Number of the document the record belongs to.
    pub number: String,
    pub field: &'static str,
    pub cached: Decimal,
    pub expected: Decimal,
}

struct Findings(Vec<Discrepancy>);

impl Findings {
    fn check(
        &mut self,
        kind: RecordKind,
        id: impl ToString,
        number: &str,
        field: &'static str,
        cached: Decimal,
        expected: Decimal,
    ) {
        if cached != expected {
            self.0.push(Discrepancy {
                kind,
                id: id.to_string(),
                number: number.to_string(),
                field,
                cached,
                expected,
            });
        }
    }
}

/// Every cached field that is out of date. `books` is not modified.
pub fn audit(books: &Books) -> Vec<Discrepancy> {
    let mut repaired = books.clone();
    recompute_all(&mut repaired);

    let mut findings = Findings(Vec::new());

    for offer in books.offers.values() {
        if let Some(fixed) = repaired.offers.get(&offer.id()) {
            let (id, number) = (offer.id(), offer.number());
            findings.check(RecordKind::Offer, id, number, "value", offer.value(), fixed.value());
        }
    }

    for proforma in books.proformas.values() {
        if let Some(fixed) = repaired.proformas.get(&proforma.id()) {
            let fields = [
                ("value", proforma.value(), fixed.value()),
                ("vat", proforma.vat(), fixed.vat()),
                ("gross", proforma.gross(), fixed.gross()),
            ];
            for (field, cached, expected) in fields {
                let (id, number) = (proforma.id(), proforma.number());
                findings.check(RecordKind::Proforma, id, number, field, cached, expected);
            }
        }
    }

    for invoice in books.invoices.values() {
        if let Some(fixed) = repaired.invoices.get(&invoice.id()) {
            let fields = [
                ("value", invoice.value(), fixed.value()),
                ("vat", invoice.vat(), fixed.vat()),
                ("gross", invoice.gross(), fixed.gross()),
                ("payed", invoice.payed(), fixed.payed()),
            ];
            for (field, cached, expected) in fields {
                let (id, number) = (invoice.id(), invoice.number());
                findings.check(RecordKind::Invoice, id, number, field, cached, expected);
            }
        }
    }

    for order in books.orders.values() {
        let Some(fixed) = repaired.orders.get(&order.id()) else {
            continue;
        };
        let (id, number) = (order.id(), order.number());
        let fields = [
            ("value", order.value(), fixed.value()),
            ("invoiced", order.invoiced(), fixed.invoiced()),
        ];
        for (field, cached, expected) in fields {
            findings.check(RecordKind::Order, id, number, field, cached, expected);
        }
        for element in order.elements() {
            if let Some(fixed_element) = fixed.element(element.id()) {
                findings.check(
                    RecordKind::OrderElement,
                    element.id(),
                    number,
                    "invoiced",
                    element.invoiced(),
                    fixed_element.invoiced(),
                );
            }
        }
    }

    findings.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::{DraftElement, IssueInvoice, Office, OfficeSettings};
    use brokerdesk_core::VatRate;
    use brokerdesk_documents::Line;
    use brokerdesk_parties::NewPerson;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn books_with_invoice() -> Books {
        let office = Office::new(OfficeSettings::default());
        let client = office.register_person(NewPerson::client("Jan Kowalski")).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        office
            .issue_invoice(IssueInvoice {
                person_id: client,
                currency: None,
                issued_on: day,
                sale_date: None,
                due_on: None,
                elements: vec![DraftElement::Line(
                    Line::new("Tłumaczenie", dec!(2), dec!(35), VatRate::default()).unwrap(),
                )],
            })
            .unwrap();
        office.snapshot().unwrap()
    }

    #[test]
    fn consistent_books_have_no_findings() {
        assert!(audit(&books_with_invoice()).is_empty());
    }

    #[test]
    fn stale_cache_is_reported_without_repair() {
        let mut books = books_with_invoice();
        let invoice_id = books.invoices.keys().next().unwrap();
        books.invoice_mut(invoice_id).unwrap().apply_payed(dec!(10));
        let before = books.clone();

        let findings = audit(&books);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.kind, RecordKind::Invoice);
        assert_eq!(finding.field, "payed");
        assert_eq!((finding.cached, finding.expected), (dec!(10), dec!(0)));
        assert_eq!(books, before);
    }
}
