//! Directory-backed report sink.
//!
//! Files are staged as a temporary file in the target directory and renamed
//! into place, so a failed export never leaves a partial document behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::ReportError;
use crate::ports::ReportSink;

/// Writes reports into a single directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for DirectoryExporter {
    fn write_report(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
        if file_name.is_empty()
            || file_name.contains(['/', '\\'])
            || file_name == "."
            || file_name == ".."
        {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid report file name '{file_name}'"),
            )));
        }

        std::fs::create_dir_all(&self.dir)?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;

        let target = self.dir.join(file_name);
        staged.persist(&target).map_err(|e| ReportError::Io(e.error))?;

        tracing::info!("Report exported to {}", target.display());
        Ok(target)
    }
}
