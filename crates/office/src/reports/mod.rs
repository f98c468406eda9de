//! Read models computed from the books.
//!
//! Every report is a pure function of a [`Books`](crate::Books) value, so it
//! can be built from the live office or from a loaded snapshot.

pub mod client_balances;
pub mod open_invoices;
pub mod order_backlog;
pub mod revenue;

pub use client_balances::{ClientBalance, client_balances};
pub use open_invoices::{OpenInvoice, OpenInvoicesSummary, open_invoices};
pub use order_backlog::{BacklogEntry, order_backlog};
pub use revenue::{MonthlyRevenue, RevenueReport, revenue};
