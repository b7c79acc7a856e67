//! Report composition and export.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::adapters::pdf;
use crate::domain::{ClinicalReport, PatientProfile, RiskAssessment};
use crate::ports::ReportSink;
use crate::CardioError;

/// MIME type of composed reports.
pub const REPORT_CONTENT_TYPE: &str = "application/pdf";

/// Compose the downloadable PDF for a finished assessment.
///
/// Identical inputs (including `generated_at`) give identical documents apart
/// from the instance half of the PDF trailer `/ID`.
///
/// # Errors
/// Returns `CardioError::ReportGeneration` if the assessment is incomplete or
/// rendering fails.
pub fn compose(
    profile: &PatientProfile,
    assessment: &RiskAssessment,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, CardioError> {
    let report = ClinicalReport::build(profile, assessment, generated_at)?;
    Ok(pdf::render(&report)?)
}

/// Timestamped file name for an exported report.
#[must_use]
pub fn report_file_name(generated_at: DateTime<Utc>) -> String {
    format!(
        "CardioCare_Report_{}.pdf",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

/// Service composing reports and handing them to a sink.
pub struct ReportService<S: ReportSink> {
    sink: S,
}

impl<S: ReportSink> ReportService<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Compose and write a report stamped with the current time.
    ///
    /// # Errors
    /// Returns `CardioError::ReportGeneration` on composition or write
    /// failure. The assessment is untouched and can be exported again.
    pub fn export(
        &self,
        profile: &PatientProfile,
        assessment: &RiskAssessment,
    ) -> Result<PathBuf, CardioError> {
        self.export_at(profile, assessment, Utc::now())
    }

    /// [`ReportService::export`] with an explicit timestamp.
    ///
    /// # Errors
    /// See [`ReportService::export`].
    pub fn export_at(
        &self,
        profile: &PatientProfile,
        assessment: &RiskAssessment,
        generated_at: DateTime<Utc>,
    ) -> Result<PathBuf, CardioError> {
        let bytes = compose(profile, assessment, generated_at)?;
        let file_name = report_file_name(generated_at);
        tracing::debug!("Composed {} bytes of {REPORT_CONTENT_TYPE}", bytes.len());
        Ok(self.sink.write_report(&file_name, &bytes)?)
    }
}
