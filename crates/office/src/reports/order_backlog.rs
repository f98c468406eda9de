use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use brokerdesk_core::{Entity, OrderId};

use crate::books::Books;

/// An order with work still to be invoiced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklogEntry {
    pub order_id: OrderId,
    pub number: String,
    pub person: String,
    pub status: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub value: Decimal,
    pub invoiced: Decimal,
    pub remaining: Decimal,
}

/// Orders outside closed statuses with a positive remaining amount, by deadline
/// (orders without one last).
pub fn order_backlog(books: &Books) -> Vec<BacklogEntry> {
    let mut rows: Vec<BacklogEntry> = books
        .orders
        .values()
        .filter(|o| o.remaining() > Decimal::ZERO)
        .filter_map(|o| {
            let status = o.status_id().and_then(|id| books.statuses.get(&id));
            if status.is_some_and(|s| s.is_closed()) {
                return None;
            }
            Some(BacklogEntry {
                order_id: o.id(),
                number: o.number().to_string(),
                person: books.person_name(o.header().person_id).to_string(),
                status: status.map(|s| s.name().to_string()),
                deadline: o.deadline(),
                value: o.value(),
                invoiced: o.invoiced(),
                remaining: o.remaining(),
            })
        })
        .collect();
    rows.sort_by(|a, b| match (a.deadline, b.deadline) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.number.cmp(&b.number),
    });
    rows
}
