//! Paged, searchable lists of documents and persons.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brokerdesk_core::PersonId;
use brokerdesk_documents::{Invoice, Offer, Order, Proforma};
use brokerdesk_parties::Person;

use crate::books::Books;

pub const DEFAULT_PER_PAGE: usize = 25;
pub const MAX_PER_PAGE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Document number in issue order (year, then sequence).
    #[default]
    Number,
    Date,
    Person,
    Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Case-insensitive substring of the number or the person's name.
    pub search: Option<String>,
    pub sort: SortKey,
    pub descending: bool,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: SortKey::default(),
            descending: false,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListQuery {
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortKey, descending: bool) -> Self {
        self.sort = sort;
        self.descending = descending;
        self
    }

    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    fn per_page(&self) -> usize {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}

impl<T> Page<T> {
    /// Cut one page out of already filtered and sorted rows. Pages past the
    /// end are empty.
    pub fn slice(rows: Vec<T>, query: &ListQuery) -> Self {
        let per_page = query.per_page();
        let page = query.page.max(1);
        let total = rows.len();
        let pages = total.div_ceil(per_page);
        let items = rows
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            items,
            total,
            page,
            per_page,
            pages,
        }
    }
}

/// A document that can be listed.
pub trait Listed {
    fn number(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn person_id(&self) -> PersonId;
    fn amount(&self) -> Decimal;
}

macro_rules! impl_listed {
    ($ty:ty, $amount:ident) => {
        impl Listed for $ty {
            fn number(&self) -> &str {
                &self.header().number
            }

            fn date(&self) -> NaiveDate {
                self.header().issued_on
            }

            fn person_id(&self) -> PersonId {
                self.header().person_id
            }

            fn amount(&self) -> Decimal {
                self.$amount()
            }
        }
    };
}

impl_listed!(Invoice, gross);
impl_listed!(Proforma, gross);
impl_listed!(Order, value);
impl_listed!(Offer, value);

/// Sort key for numbers like `FV/12/2026`: (year, sequence, text).
///
/// Numbers without two numeric parts sort by their text only.
pub fn number_key(number: &str) -> (i32, u32, &str) {
    let numeric: Vec<&str> = number
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .collect();
    match numeric.as_slice() {
        [.., sequence, year] => (
            year.parse().unwrap_or(0),
            sequence.parse().unwrap_or(0),
            number,
        ),
        _ => (0, 0, number),
    }
}

fn compare<T: Listed>(books: &Books, sort: SortKey, a: &T, b: &T) -> Ordering {
    match sort {
        SortKey::Number => number_key(a.number()).cmp(&number_key(b.number())),
        SortKey::Date => a
            .date()
            .cmp(&b.date())
            .then_with(|| number_key(a.number()).cmp(&number_key(b.number()))),
        SortKey::Person => books
            .person_name(a.person_id())
            .to_lowercase()
            .cmp(&books.person_name(b.person_id()).to_lowercase()),
        SortKey::Amount => a.amount().cmp(&b.amount()),
    }
}

/// Filter, sort and page documents.
pub fn list<'a, T, I>(books: &Books, rows: I, query: &ListQuery) -> Page<T>
where
    T: Listed + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let needle = query.needle();
    let mut found: Vec<&T> = rows
        .into_iter()
        .filter(|row| match &needle {
            Some(needle) => {
                row.number().to_lowercase().contains(needle.as_str())
                    || books.person_name(row.person_id()).to_lowercase().contains(needle.as_str())
            }
            None => true,
        })
        .collect();
    found.sort_by(|a, b| {
        let ord = compare(books, query.sort, *a, *b);
        if query.descending { ord.reverse() } else { ord }
    });
    Page::slice(found.into_iter().cloned().collect(), query)
}

/// Persons sorted by name; search matches the name or the tax id.
pub fn list_persons<'a>(
    persons: impl IntoIterator<Item = &'a Person>,
    query: &ListQuery,
) -> Page<Person> {
    let needle = query.needle();
    // Tax ids are stored as bare digits.
    let digits = needle.as_deref().map(|n| {
        n.chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
    });
    let mut found: Vec<&Person> = persons
        .into_iter()
        .filter(|p| match &needle {
            Some(needle) => {
                p.name().to_lowercase().contains(needle.as_str())
                    || digits.as_deref().is_some_and(|d| {
                        !d.is_empty() && p.tax_id().is_some_and(|t| t.contains(d))
                    })
            }
            None => true,
        })
        .collect();
    found.sort_by_key(|p| p.name().to_lowercase());
    if query.descending {
        found.reverse();
    }
    Page::slice(found.into_iter().cloned().collect(), query)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use brokerdesk_parties::NewPerson;

    use super::*;

    #[test]
    fn numbers_sort_naturally() {
        let mut numbers = vec!["FV/10/2026", "FV/2/2026", "FV/11/2025", "FV/1/2026"];
        numbers.sort_by(|a, b| number_key(a).cmp(&number_key(b)));
        assert_eq!(numbers, vec!["FV/11/2025", "FV/1/2026", "FV/2/2026", "FV/10/2026"]);
    }

    #[test]
    fn page_is_clamped_and_one_based() {
        let rows: Vec<u32> = (1..=45).collect();

        let first = Page::slice(rows.clone(), &ListQuery::default().page(0, 20));
        assert_eq!(first.page, 1);
        assert_eq!(first.items.first(), Some(&1));
        assert_eq!(first.pages, 3);

        let last = Page::slice(rows.clone(), &ListQuery::default().page(3, 20));
        assert_eq!(last.items, vec![41, 42, 43, 44, 45]);

        let huge = Page::slice(rows.clone(), &ListQuery::default().page(1, 10_000));
        assert_eq!(huge.per_page, MAX_PER_PAGE);
        assert_eq!(huge.items.len(), 45);

        let past = Page::slice(rows, &ListQuery::default().page(9, 20));
        assert!(past.items.is_empty());
        assert_eq!(past.total, 45);
    }

    #[test]
    fn empty_list_has_no_pages() {
        let page = Page::<u32>::slice(Vec::new(), &ListQuery::default());
        assert_eq!((page.total, page.pages), (0, 0));
    }

    #[test]
    fn person_search_ignores_tax_id_separators() {
        let mut input = NewPerson::client("Biuro Tłumaczeń Lingua");
        input.tax_id = Some("1234567890".to_string());
        let person = Person::register(PersonId::new(), input, Utc::now()).unwrap();
        let other = Person::register(
            PersonId::new(),
            NewPerson::client("Kancelaria Iustitia"),
            Utc::now(),
        )
        .unwrap();
        let persons = [person, other];

        for needle in ["123-456-78-90", "123 456", "4567890"] {
            let page = list_persons(&persons, &ListQuery::default().search(needle));
            assert_eq!(page.total, 1, "search {needle:?}");
            assert_eq!(page.items[0].name(), "Biuro Tłumaczeń Lingua");
        }

        let page = list_persons(&persons, &ListQuery::default().search("--"));
        assert_eq!(page.total, 0);
    }
}
