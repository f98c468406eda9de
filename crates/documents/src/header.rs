use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use brokerdesk_catalog::Currency;
use brokerdesk_core::{PersonId, Timestamps};

/// Fields every numbered document carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub number: String,
    pub person_id: PersonId,
    pub currency: Currency,
    pub issued_on: NaiveDate,
    pub timestamps: Timestamps,
}

impl Header {
    pub fn new(
        number: impl Into<String>,
        person_id: PersonId,
        currency: Currency,
        issued_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            number: number.into(),
            person_id,
            currency,
            issued_on,
            timestamps: Timestamps::new(now),
        }
    }

    /// Copy for a derived document (storno, conversion) with its own number and dates.
    pub fn derive(
        &self,
        number: impl Into<String>,
        issued_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(number, self.person_id, self.currency.clone(), issued_on, now)
    }
}
