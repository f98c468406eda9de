use serde::{Deserialize, Serialize};

use brokerdesk_core::{DomainError, DomainResult, Entity, StatusId};

/// Order workflow status ("new", "in translation", "done", ...).
///
/// A closed status marks a finished order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    id: StatusId,
    name: String,
    closed: bool,
    position: u32,
}

impl Status {
    pub fn new(
        id: StatusId,
        name: impl Into<String>,
        closed: bool,
        position: u32,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("status name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            closed,
            position,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn position(&self) -> u32 {
        self.position
    }
}

impl Entity for Status {
    type Id = StatusId;

    fn id(&self) -> StatusId {
        self.id
    }
}
