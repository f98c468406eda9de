use serde::{Deserialize, Serialize};

use brokerdesk_core::{DomainError, DomainResult};

/// Currency a document is issued in. Amounts are never converted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    name: String,
    symbol: String,
}

impl Currency {
    pub fn new(
        code: impl AsRef<str>,
        name: impl Into<String>,
        symbol: impl Into<String>,
    ) -> DomainResult<Self> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency code must be 3 letters, got {code:?}"
            )));
        }
        Ok(Self {
            code,
            name: name.into(),
            symbol: symbol.into(),
        })
    }

    pub fn pln() -> Self {
        Self {
            code: "PLN".to_string(),
            name: "złoty".to_string(),
            symbol: "zł".to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::pln()
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code)
    }
}
