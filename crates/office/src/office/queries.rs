use chrono::NaiveDate;

use brokerdesk_documents::{Invoice, Offer, Order, Proforma};
use brokerdesk_parties::Person;

use super::Office;
use crate::error::OfficeResult;
use crate::listing::{self, ListQuery, Page};
use crate::reports::{self, BacklogEntry, ClientBalance, OpenInvoicesSummary, RevenueReport};

impl Office {
    pub fn list_invoices(&self, query: &ListQuery) -> OfficeResult<Page<Invoice>> {
        self.read(|books| listing::list(books, books.invoices.values(), query))
    }

    pub fn list_orders(&self, query: &ListQuery) -> OfficeResult<Page<Order>> {
        self.read(|books| listing::list(books, books.orders.values(), query))
    }

    pub fn list_offers(&self, query: &ListQuery) -> OfficeResult<Page<Offer>> {
        self.read(|books| listing::list(books, books.offers.values(), query))
    }

    pub fn list_proformas(&self, query: &ListQuery) -> OfficeResult<Page<Proforma>> {
        self.read(|books| listing::list(books, books.proformas.values(), query))
    }

    pub fn list_persons(&self, query: &ListQuery) -> OfficeResult<Page<Person>> {
        self.read(|books| listing::list_persons(books.persons.values(), query))
    }

    pub fn open_invoices(&self, today: NaiveDate) -> OfficeResult<OpenInvoicesSummary> {
        self.read(|books| reports::open_invoices(books, today))
    }

    pub fn client_balances(&self) -> OfficeResult<Vec<ClientBalance>> {
        self.read(reports::client_balances)
    }

    /// Monthly revenue of `year` in the office currency.
    pub fn revenue(&self, year: i32) -> OfficeResult<RevenueReport> {
        let currency = self.settings().currency.code().to_string();
        self.read(|books| reports::revenue(books, year, &currency))
    }

    pub fn order_backlog(&self) -> OfficeResult<Vec<BacklogEntry>> {
        self.read(reports::order_backlog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::SortKey;
    use crate::office::{DraftElement, IssueInvoice, OfficeSettings};
    use brokerdesk_core::{PersonId, VatRate};
    use brokerdesk_documents::Line;
    use brokerdesk_parties::NewPerson;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn issue(office: &Office, client: PersonId, net: Decimal) {
        office
            .issue_invoice(IssueInvoice {
                person_id: client,
                currency: None,
                issued_on: NaiveDate::from_ymd_opt(2026, 4, 14).unwrap(),
                sale_date: None,
                due_on: None,
                elements: vec![DraftElement::Line(
                    Line::new("Tłumaczenie", dec!(1), net, VatRate::default()).unwrap(),
                )],
            })
            .unwrap();
    }

    fn office() -> Office {
        let office = Office::new(OfficeSettings::default());
        let anna = office.register_person(NewPerson::client("Anna Nowak")).unwrap();
        let piotr = office.register_person(NewPerson::client("Piotr Zając")).unwrap();
        for i in 1..=12 {
            issue(&office, if i % 3 == 0 { piotr } else { anna }, Decimal::from(i * 10));
        }
        office
    }

    #[test]
    fn invoices_search_by_person_name() {
        let office = office();
        let page = office.list_invoices(&ListQuery::default().search("zając")).unwrap();
        assert_eq!(page.total, 4);
        assert!(page.items.iter().all(|i| i.gross() > Decimal::ZERO));
    }

    #[test]
    fn invoices_sort_by_number_descending_across_pages() {
        let office = office();
        let query = ListQuery::default()
            .sorted_by(SortKey::Number, true)
            .page(2, 5);
        let page = office.list_invoices(&query).unwrap();
        assert_eq!((page.total, page.pages), (12, 3));
        let numbers: Vec<&str> = page.items.iter().map(|i| i.number()).collect();
        assert_eq!(numbers, vec!["FV/7/2026", "FV/6/2026", "FV/5/2026", "FV/4/2026", "FV/3/2026"]);
    }

    #[test]
    fn invoices_sort_by_amount() {
        let office = office();
        let query = ListQuery::default().sorted_by(SortKey::Amount, true).page(1, 1);
        let page = office.list_invoices(&query).unwrap();
        assert_eq!(page.items[0].value(), dec!(120));
    }

    #[test]
    fn persons_are_listed_by_name() {
        let office = office();
        let page = office.list_persons(&ListQuery::default()).unwrap();
        let names: Vec<&str> = page.items.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Anna Nowak", "Piotr Zając"]);
    }
}
