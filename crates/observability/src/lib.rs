//! Logging setup shared by the binaries.

/// Subscriber configuration (filters, output format).
pub mod logging;

pub use logging::{LogFormat, ParseLogFormatError, init};
