//! `brokerdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, money arithmetic and the small traits
//! every record implements.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{ExpectedVersion, Versioned};
pub use entity::{Entity, Timestamps};
pub use error::{DomainError, DomainResult};
pub use id::{
    AppointmentId, InvoiceElementId, InvoiceId, OfferElementId, OfferId, OrderElementId, OrderId,
    PaymentElementId, PaymentId, PersonId, ProformaElementId, ProformaId, ReceiptId, ServiceId,
    StatusId,
};
pub use money::{
    Amounts, MAX_LINE_MAGNITUDE, VatRate, checked_line_total, line_total, round_money,
};
