//! Parties domain module (clients and providers).
//!
//! This crate contains business rules for the people and companies the office
//! works with, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod person;

pub use person::{ContactInfo, NewPerson, Person, PersonChanges, PersonKind};
