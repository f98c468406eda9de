//! Document numbering.
//!
//! One serial per document kind; numbers look like `FV/17/2026` and restart
//! from 1 with every calendar year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use brokerdesk_core::{DomainError, DomainResult};

/// Kinds of numbered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Offer,
    Order,
    Proforma,
    Invoice,
    /// Storno (correction) invoices.
    Correction,
    Receipt,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        DocumentKind::Offer,
        DocumentKind::Order,
        DocumentKind::Proforma,
        DocumentKind::Invoice,
        DocumentKind::Correction,
        DocumentKind::Receipt,
    ];

    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Offer => "OF/",
            DocumentKind::Order => "ZL/",
            DocumentKind::Proforma => "PF/",
            DocumentKind::Invoice => "FV/",
            DocumentKind::Correction => "KOR/",
            DocumentKind::Receipt => "KP/",
        }
    }
}

/// Next number and prefix of one document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serial {
    prefix: String,
    next: u32,
    year: i32,
}

impl Serial {
    pub fn new(prefix: impl Into<String>, year: i32) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            year,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_number(&self) -> u32 {
        self.next
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Move the counter, e.g. when starting mid-year after a migration.
    pub fn set_next(&mut self, next: u32) -> DomainResult<()> {
        if next == 0 {
            return Err(DomainError::validation("serial numbers start at 1"));
        }
        self.next = next;
        Ok(())
    }

    /// Hand out the next number for a document dated `on`.
    ///
    /// Documents dated in an earlier year than the counter are rejected: the
    /// previous year is closed once the first number of a new year is issued.
    pub fn issue(&mut self, on: NaiveDate) -> DomainResult<String> {
        let year = on.year();
        if year < self.year {
            return Err(DomainError::invariant(format!(
                "numbering for {year} is closed (serial is at {})",
                self.year
            )));
        }
        if year > self.year {
            self.year = year;
            self.next = 1;
        }
        let number = format!("{}{}/{}", self.prefix, self.next, self.year);
        self.next += 1;
        Ok(number)
    }
}

/// All serials, created lazily with default prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerialBook {
    serials: BTreeMap<DocumentKind, Serial>,
}

impl SerialBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&Serial> {
        self.serials.get(&kind)
    }

    pub fn get_or_create(&mut self, kind: DocumentKind, on: NaiveDate) -> &mut Serial {
        self.serials
            .entry(kind)
            .or_insert_with(|| Serial::new(kind.default_prefix(), on.year()))
    }

    pub fn issue(&mut self, kind: DocumentKind, on: NaiveDate) -> DomainResult<String> {
        self.get_or_create(kind, on).issue(on)
    }

    pub fn set_prefix(&mut self, kind: DocumentKind, prefix: impl Into<String>, on: NaiveDate) {
        let serial = self.get_or_create(kind, on);
        serial.prefix = prefix.into();
    }
}
