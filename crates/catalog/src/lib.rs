//! Catalog module: currencies, order statuses and the billable service list.
//!
//! These are small reference records edited rarely and read by every document.

pub mod currency;
pub mod service;
pub mod status;

pub use currency::Currency;
pub use service::Service;
pub use status::Status;
