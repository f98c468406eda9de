//! Strongly-typed identifiers used across the domain.
//!
//! Every record kind gets its own newtype so an invoice id can never be passed
//! where an order id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

define_id!(
    /// Identifier of a client or provider.
    PersonId,
    "PersonId"
);
define_id!(OrderId, "OrderId");
define_id!(OrderElementId, "OrderElementId");
define_id!(OfferId, "OfferId");
define_id!(OfferElementId, "OfferElementId");
define_id!(ProformaId, "ProformaId");
define_id!(ProformaElementId, "ProformaElementId");
define_id!(InvoiceId, "InvoiceId");
define_id!(InvoiceElementId, "InvoiceElementId");
define_id!(PaymentId, "PaymentId");
define_id!(PaymentElementId, "PaymentElementId");
define_id!(
    /// Identifier of a cash receipt (KP).
    ReceiptId,
    "ReceiptId"
);
define_id!(
    /// Identifier of an order workflow status.
    StatusId,
    "StatusId"
);
define_id!(
    /// Identifier of a catalog service.
    ServiceId,
    "ServiceId"
);
define_id!(AppointmentId, "AppointmentId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_its_own_display_form() {
        let id = InvoiceId::new();
        let parsed: InvoiceId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_error_names_the_identifier_kind() {
        let err = "not-a-uuid".parse::<OrderId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) if msg.starts_with("OrderId") => {}
            other => panic!("expected InvalidId for OrderId, got {other:?}"),
        }
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let uuid = Uuid::now_v7();
        let id = PersonId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
