//! Office layer: the books, the reconciliation of cached document values, and
//! the application service every operation goes through.
//!
//! ## Transactions
//!
//! Every mutating [`Office`] operation works on a private copy of the
//! [`Books`]. The operation changes records, the reconciler brings every
//! affected cache (order value, invoice totals, invoiced and payed amounts)
//! back in line, and the copy replaces the committed books only if all of it
//! succeeded.

pub mod allocation;
pub mod audit;
pub mod books;
pub mod error;
pub mod listing;
pub mod office;
pub mod reconcile;
pub mod reports;
pub mod snapshot;
pub mod table;

pub use allocation::Allocation;
pub use audit::{Discrepancy, RecordKind};
pub use books::Books;
pub use error::{OfficeError, OfficeResult};
pub use listing::{ListQuery, Page, SortKey};
pub use office::{
    CreateOffer, CreateOrder, CreateProforma, DraftElement, IssueInvoice, Office, OfficeSettings,
    RegisterPayment,
};
pub use reconcile::RepairSummary;
pub use snapshot::SnapshotStore;
pub use table::Table;
