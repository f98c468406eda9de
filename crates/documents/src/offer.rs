use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::{
    DomainError, DomainResult, Entity, OfferElementId, OfferId, OrderElementId, OrderId, Versioned,
};

use crate::header::Header;
use crate::line::Line;
use crate::order::{Order, OrderElement};
use crate::totals::DocumentTotals;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferElement {
    pub id: OfferElementId,
    pub line: Line,
}

/// Price offer sent to a prospective client; accepted offers become orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    header: Header,
    valid_until: NaiveDate,
    elements: Vec<OfferElement>,
    /// Cached net value.
    value: Decimal,
    accepted_order: Option<OrderId>,
    version: u64,
}

impl Offer {
    pub fn new(
        id: OfferId,
        header: Header,
        valid_until: NaiveDate,
        lines: Vec<Line>,
    ) -> DomainResult<Self> {
        if valid_until < header.issued_on {
            return Err(DomainError::validation("offer validity ends before it is issued"));
        }
        if lines.is_empty() {
            return Err(DomainError::validation("cannot create an offer without elements"));
        }
        let elements = lines
            .into_iter()
            .map(|line| {
                line.validate()?;
                Ok(OfferElement {
                    id: OfferElementId::new(),
                    line,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let mut offer = Self {
            id,
            header,
            valid_until,
            elements,
            value: Decimal::ZERO,
            accepted_order: None,
            version: 1,
        };
        offer.recompute_value();
        Ok(offer)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn number(&self) -> &str {
        &self.header.number
    }

    pub fn valid_until(&self) -> NaiveDate {
        self.valid_until
    }

    pub fn elements(&self) -> &[OfferElement] {
        &self.elements
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn accepted_order(&self) -> Option<OrderId> {
        self.accepted_order
    }

    pub fn totals(&self) -> DocumentTotals {
        DocumentTotals::from_lines(self.elements.iter().map(|e| &e.line))
    }

    pub fn recompute_value(&mut self) -> bool {
        let value = self.totals().net();
        let changed = value != self.value;
        self.value = value;
        changed
    }

    /// Turn the offer into an order carrying copies of its elements.
    ///
    /// An offer is accepted at most once, and only while it is valid.
    pub fn accept(
        &mut self,
        order_id: OrderId,
        order_header: Header,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        if self.accepted_order.is_some() {
            return Err(DomainError::conflict("offer has already been accepted"));
        }
        if order_header.issued_on > self.valid_until {
            return Err(DomainError::invariant(format!(
                "offer expired on {}",
                self.valid_until
            )));
        }

        let mut order = Order::new(order_id, order_header, format!("Oferta {}", self.number()))
            .from_offer(self.id);
        for element in self.elements.iter().filter(|e| !e.line.cancelled) {
            order.add_element(
                OrderElement::new(OrderElementId::new(), element.line.clone())?,
                now,
            )?;
        }

        self.accepted_order = Some(order_id);
        self.version += 1;
        self.header.timestamps.touch(now);
        Ok(order)
    }
}

impl Entity for Offer {
    type Id = OfferId;

    fn id(&self) -> OfferId {
        self.id
    }
}

impl Versioned for Offer {
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
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn offer(person_id: PersonId) -> Offer {
        let header = Header::new("OF/1/2026", person_id, Currency::pln(), date(1), Utc::now());
        Offer::new(
            OfferId::new(),
            header,
            date(14),
            vec![
                Line::new("Tłumaczenie dyplomu", dec!(2), dec!(55), VatRate::default()).unwrap(),
                Line::new("Poświadczenie", dec!(1), dec!(20), VatRate::default()).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn accept_copies_elements_into_order() {
        let person = PersonId::new();
        let mut offer = offer(person);
        assert_eq!(offer.value(), dec!(130));

        let order_header = Header::new("ZL/1/2026", person, Currency::pln(), date(3), Utc::now());
        let order_id = OrderId::new();
        let order = offer.accept(order_id, order_header, Utc::now()).unwrap();

        assert_eq!(order.value(), dec!(130));
        assert_eq!(order.elements().len(), 2);
        assert_eq!(order.offer_id(), Some(offer.id()));
        assert_eq!(offer.accepted_order(), Some(order_id));
    }

    #[test]
    fn accept_twice_conflicts() {
        let person = PersonId::new();
        let mut offer = offer(person);
        let h = || Header::new("ZL/1/2026", person, Currency::pln(), date(3), Utc::now());
        offer.accept(OrderId::new(), h(), Utc::now()).unwrap();
        assert!(matches!(
            offer.accept(OrderId::new(), h(), Utc::now()),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn expired_offer_cannot_be_accepted() {
        let person = PersonId::new();
        let mut offer = offer(person);
        let late = Header::new("ZL/1/2026", person, Currency::pln(), date(20), Utc::now());
        assert!(offer.accept(OrderId::new(), late, Utc::now()).is_err());
        assert_eq!(offer.accepted_order(), None);
    }
}
