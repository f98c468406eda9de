use thiserror::Error;

use brokerdesk_core::DomainError;

pub type OfficeResult<T> = Result<T, OfficeError>;

#[derive(Debug, Error)]
pub enum OfficeError {
    /// Business rule rejected the operation; nothing was committed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("unsupported snapshot format version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}

impl OfficeError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The domain error behind this failure, if any.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            OfficeError::Domain(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.as_domain().is_some_and(DomainError::is_validation)
    }

    pub fn is_invariant(&self) -> bool {
        self.as_domain().is_some_and(DomainError::is_invariant)
    }

    pub fn is_conflict(&self) -> bool {
        self.as_domain().is_some_and(DomainError::is_conflict)
    }
}
