use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    Amounts, DomainError, DomainResult, Entity, InvoiceElementId, InvoiceId, ProformaElementId,
    ProformaId, Versioned,
};

use crate::header::Header;
use crate::invoice::{Invoice, InvoiceElement, NewInvoice, OrderLink};
use crate::line::Line;
use crate::totals::DocumentTotals;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProformaElement {
    pub id: ProformaElementId,
    pub line: Line,
    pub order_link: Option<OrderLink>,
}

/// Pre-invoice. Never counts as invoiced; converting it issues the real invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proforma {
    id: ProformaId,
    header: Header,
    due_on: NaiveDate,
    elements: Vec<ProformaElement>,
    /// Cached net / VAT / gross.
    amounts: Amounts,
    converted_to: Option<InvoiceId>,
    cancelled: bool,
    version: u64,
}

impl Proforma {
    pub fn new(
        id: ProformaId,
        header: Header,
        due_on: NaiveDate,
        elements: Vec<(Line, Option<OrderLink>)>,
    ) -> DomainResult<Self> {
        if elements.is_empty() {
            return Err(DomainError::validation("cannot create a proforma without elements"));
        }
        if due_on < header.issued_on {
            return Err(DomainError::validation("due date cannot precede the issue date"));
        }
        let elements = elements
            .into_iter()
            .map(|(line, order_link)| {
                line.validate()?;
                Ok(ProformaElement {
                    id: ProformaElementId::new(),
                    line,
                    order_link,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let mut proforma = Self {
            id,
            header,
            due_on,
            elements,
            amounts: Amounts::zero(),
            converted_to: None,
            cancelled: false,
            version: 1,
        };
        proforma.recompute_totals();
        Ok(proforma)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn number(&self) -> &str {
        &self.header.number
    }

    pub fn due_on(&self) -> NaiveDate {
        self.due_on
    }

    pub fn elements(&self) -> &[ProformaElement] {
        &self.elements
    }

    pub fn value(&self) -> Decimal {
        self.amounts.net
    }

    pub fn vat(&self) -> Decimal {
        self.amounts.vat
    }

    pub fn gross(&self) -> Decimal {
        self.amounts.gross
    }

    pub fn converted_to(&self) -> Option<InvoiceId> {
        self.converted_to
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn recompute_totals(&mut self) -> bool {
        let amounts = DocumentTotals::from_lines(self.elements.iter().map(|e| &e.line)).amounts;
        let changed = amounts != self.amounts;
        self.amounts = amounts;
        changed
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.converted_to.is_some() {
            return Err(DomainError::invariant(
                "a converted proforma cannot be cancelled; cancel the invoice instead",
            ));
        }
        if self.cancelled {
            return Err(DomainError::conflict("proforma is already cancelled"));
        }
        self.cancelled = true;
        self.bump(now);
        Ok(())
    }

    /// Issue the final invoice from this proforma (at most once).
    pub fn convert(
        &mut self,
        invoice_id: InvoiceId,
        header: Header,
        sale_date: NaiveDate,
        due_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Invoice> {
        if self.cancelled {
            return Err(DomainError::invariant("a cancelled proforma cannot be converted"));
        }
        if self.converted_to.is_some() {
            return Err(DomainError::conflict("proforma has already been converted"));
        }

        let elements = self
            .elements
            .iter()
            .filter(|e| !e.line.cancelled)
            .map(|e| InvoiceElement::new(InvoiceElementId::new(), e.line.clone(), e.order_link))
            .collect::<DomainResult<Vec<_>>>()?;

        let invoice = Invoice::issue(
            invoice_id,
            NewInvoice {
                header,
                sale_date,
                due_on,
                elements,
                proforma_id: Some(self.id),
            },
        )?;

        self.converted_to = Some(invoice_id);
        self.bump(now);
        Ok(invoice)
    }

    fn bump(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.header.timestamps.touch(now);
    }
}

impl Entity for Proforma {
    type Id = ProformaId;

    fn id(&self) -> ProformaId {
        self.id
    }
}

impl Versioned for Proforma {
    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_catalog::Currency;
    use brokerdesk_core::{PersonId, VatRate};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, d).unwrap()
    }

    fn proforma() -> Proforma {
        let header = Header::new("PF/1/2026", PersonId::new(), Currency::pln(), date(1), Utc::now());
        Proforma::new(
            ProformaId::new(),
            header,
            date(8),
            vec![(
                Line::new("Zaliczka na tłumaczenie", dec!(1), dec!(400), VatRate::default()).unwrap(),
                None,
            )],
        )
        .unwrap()
    }

    #[test]
    fn convert_issues_invoice_with_same_totals() {
        let mut pf = proforma();
        assert_eq!(pf.gross(), dec!(492));

        let header = pf.header().derive("FV/1/2026", date(2), Utc::now());
        let invoice_id = InvoiceId::new();
        let invoice = pf
            .convert(invoice_id, header, date(2), date(16), Utc::now())
            .unwrap();

        assert_eq!(invoice.gross(), pf.gross());
        assert_eq!(invoice.proforma_id(), Some(pf.id()));
        assert_eq!(invoice.header().person_id, pf.header().person_id);
        assert_eq!(pf.converted_to(), Some(invoice_id));
    }

    #[test]
    fn convert_only_once() {
        let mut pf = proforma();
        let h = |n: &str| pf.header().derive(n, date(2), Utc::now());
        let (h1, h2) = (h("FV/1/2026"), h("FV/2/2026"));
        pf.convert(InvoiceId::new(), h1, date(2), date(16), Utc::now())
            .unwrap();
        assert!(matches!(
            pf.convert(InvoiceId::new(), h2, date(2), date(16), Utc::now()),
            Err(DomainError::Conflict(_))
        ));
        assert!(pf.cancel(Utc::now()).is_err());
    }

    #[test]
    fn cancelled_proforma_cannot_be_converted() {
        let mut pf = proforma();
        pf.cancel(Utc::now()).unwrap();
        let header = pf.header().derive("FV/1/2026", date(2), Utc::now());
        assert!(pf
            .convert(InvoiceId::new(), header, date(2), date(16), Utc::now())
            .is_err());
    }
}
