//! Documents domain module: offers, orders, proformas, invoices, payments and
//! receipts, plus the document numbering serials.
//!
//! Business rules only (no IO, no storage). Cached totals live on the
//! documents themselves; keeping caches of *related* documents in step is the
//! job of the office layer.

pub mod header;
pub mod invoice;
pub mod line;
pub mod offer;
pub mod order;
pub mod payment;
pub mod proforma;
pub mod receipt;
pub mod serial;
pub mod totals;

pub use header::Header;
pub use invoice::{Invoice, InvoiceElement, InvoiceKind, NewInvoice, OrderLink};
pub use line::Line;
pub use offer::{Offer, OfferElement};
pub use order::{Order, OrderElement};
pub use payment::{Payment, PaymentElement, PaymentKind, PaymentMethod};
pub use proforma::{Proforma, ProformaElement};
pub use receipt::Receipt;
pub use serial::{DocumentKind, Serial, SerialBook};
pub use totals::DocumentTotals;
