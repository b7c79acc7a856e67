//! Export port: where finished report documents go.

use std::path::PathBuf;

use crate::domain::ReportError;

/// Destination for rendered report bytes.
pub trait ReportSink: Send + Sync {
    /// Persist `bytes` under `file_name`.
    ///
    /// Implementations must not leave partial or temporary files behind when
    /// they fail.
    ///
    /// # Errors
    /// Returns `ReportError::Io` if the document cannot be written.
    fn write_report(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError>;
}
