//! Per-user session state: the latest assessment and the profile behind it.

use std::path::PathBuf;

use crate::domain::{PatientProfile, ReportError, RiskAssessment};
use crate::ports::{ReportSink, RiskClassifier};
use crate::CardioError;

use super::{AssessmentService, ReportService};

/// Latest assessment of this session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub profile: PatientProfile,
    pub assessment: RiskAssessment,
}

/// Explicit holder of the most recent assessment.
///
/// A new assessment replaces the previous one. A failed assessment clears it,
/// so a report can never be exported for stale inputs.
#[derive(Debug, Default)]
pub struct AssessmentSession {
    latest: Option<SessionEntry>,
}

impl AssessmentSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finished assessment, superseding any earlier one.
    pub fn record(&mut self, profile: PatientProfile, assessment: RiskAssessment) {
        self.latest = Some(SessionEntry {
            profile,
            assessment,
        });
    }

    #[must_use]
    pub fn current(&self) -> Option<&SessionEntry> {
        self.latest.as_ref()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }

    /// Run an assessment and record the outcome.
    ///
    /// # Errors
    /// Propagates the service error after clearing the session.
    pub fn assess<C: RiskClassifier>(
        &mut self,
        service: &AssessmentService<C>,
        profile: PatientProfile,
    ) -> Result<&SessionEntry, CardioError> {
        match service.assess(&profile) {
            Ok(assessment) => Ok(self.latest.insert(SessionEntry {
                profile,
                assessment,
            })),
            Err(e) => {
                self.clear();
                Err(e)
            }
        }
    }

    /// Export the current assessment through `reports`.
    ///
    /// # Errors
    /// Returns `CardioError::ReportGeneration` if there is nothing to export
    /// or the export fails. A failed export keeps the assessment.
    pub fn export<S: ReportSink>(&self, reports: &ReportService<S>) -> Result<PathBuf, CardioError> {
        let entry = self.latest.as_ref().ok_or(ReportError::IncompleteAssessment(
            "no assessment in this session",
        ))?;
        reports.export(&entry.profile, &entry.assessment)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::DirectoryExporter;
    use crate::application::assessment::testing::FixedClassifier;
    use crate::domain::{fixtures, RiskLabel};
    use tempfile::tempdir;

    #[test]
    fn test_new_assessment_supersedes() {
        let high = AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::High, None)));
        let low = AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::Low, None)));
        let mut session = AssessmentSession::new();

        session.assess(&high, fixtures::high_risk()).expect("first");
        session.assess(&low, fixtures::healthy()).expect("second");

        let entry = session.current().expect("entry");
        assert_eq!(entry.assessment.label, RiskLabel::Low);
        assert_eq!(entry.profile, fixtures::healthy());
    }

    #[test]
    fn test_failed_assessment_clears() {
        let service = AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::Low, None)));
        let mut session = AssessmentSession::new();
        session.assess(&service, fixtures::healthy()).expect("first");

        let mut invalid = fixtures::healthy();
        invalid.age_years = 0;
        assert!(session.assess(&service, invalid).is_err());
        assert!(session.current().is_none());
    }

    #[test]
    fn test_export_requires_assessment() {
        let dir = tempdir().expect("tempdir");
        let reports = ReportService::new(DirectoryExporter::new(dir.path()));
        let session = AssessmentSession::new();

        assert!(matches!(
            session.export(&reports),
            Err(CardioError::ReportGeneration(
                ReportError::IncompleteAssessment(_)
            ))
        ));
    }

    #[test]
    fn test_export_writes_report() {
        let dir = tempdir().expect("tempdir");
        let reports = ReportService::new(DirectoryExporter::new(dir.path()));
        let service =
            AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::High, Some(0.7))));
        let mut session = AssessmentSession::new();
        session.assess(&service, fixtures::high_risk()).expect("assess");

        let path = session.export(&reports).expect("export");
        let bytes = std::fs::read(&path).expect("read");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(session.current().is_some());
    }
}
