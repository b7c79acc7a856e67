//! Assessment service: one scoring pass over a patient profile.
//!
//! This service coordinates:
//! - Range validation
//! - Feature encoding for the classifier's layout
//! - Classifier prediction (label + optional probability)
//! - Heart score and insight rules

use std::sync::Arc;

use crate::domain::{
    encode, generate_insights, score, InsightInputs, PatientProfile, RiskAssessment,
};
use crate::ports::{ModelError, RiskClassifier};
use crate::CardioError;

/// Service for producing risk assessments.
pub struct AssessmentService<C: RiskClassifier> {
    classifier: Arc<C>,
}

impl<C: RiskClassifier> AssessmentService<C> {
    /// Create a new assessment service around a loaded classifier.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Run the full pipeline for one profile.
    ///
    /// # Errors
    /// Returns `CardioError::InvalidInput` if any field is out of range (the
    /// classifier is never called), or `CardioError::ModelUnavailable` if the
    /// classifier rejects the vector.
    pub fn assess(&self, profile: &PatientProfile) -> Result<RiskAssessment, CardioError> {
        profile
            .validate()
            .map_err(|errors| CardioError::InvalidInput(errors.join("; ")))?;

        let layout = self.classifier.layout();
        let vector = encode(profile, layout);
        tracing::debug!("Encoded {} features ({layout} layout)", vector.len());

        let label = self.classifier.predict(&vector)?;
        let probability = self.classifier.predict_probability(&vector)?;
        if let Some(p) = probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(ModelError::Malformed(format!("probability {p} outside [0, 1]")).into());
            }
        }

        let heart = score(profile);
        let mut risk_enhancers = profile.risk_enhancers.clone();
        risk_enhancers.sort();
        risk_enhancers.dedup();

        let inputs = InsightInputs::from_profile(profile, heart.bmi());
        let insights = generate_insights(label, &inputs, &risk_enhancers);

        tracing::info!(
            "Assessment complete: label {}, heart score {}/7, {} insights",
            label.as_label(),
            heart.score(),
            insights.len()
        );

        Ok(RiskAssessment {
            label,
            probability,
            heart_score: heart.score(),
            bmi: heart.bmi(),
            insights,
            risk_enhancers,
            assessed_at: chrono::Utc::now(),
        })
    }

    /// The classifier this service runs.
    #[must_use]
    pub fn classifier(&self) -> &Arc<C> {
        &self.classifier
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedClassifier;
    use super::*;
    use crate::domain::{fixtures, RiskEnhancer, RiskLabel};

    #[test]
    fn test_high_risk_pipeline() {
        let classifier = Arc::new(FixedClassifier::new(RiskLabel::High, Some(0.91)));
        let service = AssessmentService::new(Arc::clone(&classifier));

        let profile = fixtures::high_risk();
        let assessment = service.assess(&profile).expect("assess");

        assert_eq!(assessment.label, RiskLabel::High);
        assert_eq!(assessment.probability, Some(0.91));
        assert_eq!(assessment.heart_score, 0);
        assert!((assessment.bmi - 28.0).abs() < 1e-9);
        assert_eq!(assessment.insights.len(), 8);
        assert!(assessment.insights[0].message.starts_with("HIGH RISK:"));
        assert_eq!(classifier.calls(), 1);
    }

    #[test]
    fn test_invalid_input_skips_classifier() {
        let classifier = Arc::new(FixedClassifier::new(RiskLabel::Low, None));
        let service = AssessmentService::new(Arc::clone(&classifier));

        let mut profile = fixtures::healthy();
        profile.systolic = 300;
        profile.height_cm = f64::NAN;

        match service.assess(&profile) {
            Err(CardioError::InvalidInput(message)) => {
                assert!(message.contains("Systolic"));
                assert!(message.contains("Height"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn test_enhancers_are_canonicalized() {
        let service =
            AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::High, None)));
        let mut profile = fixtures::healthy();
        profile.risk_enhancers = vec![
            RiskEnhancer::InflammatoryConditions,
            RiskEnhancer::FamilyHistory,
            RiskEnhancer::InflammatoryConditions,
        ];

        let assessment = service.assess(&profile).expect("assess");
        assert_eq!(
            assessment.enhancer_names(),
            vec![
                "Family History of Heart Disease",
                "Chronic Inflammatory Conditions"
            ]
        );
        assert!(assessment
            .insight_messages()
            .last()
            .is_some_and(|m| m.contains("2 clinical enhancer")));
    }

    #[test]
    fn test_encodes_for_classifier_layout() {
        let mut classifier = FixedClassifier::new(RiskLabel::Low, None);
        classifier.layout = crate::domain::FeatureLayout::WithBmi;
        let service = AssessmentService::new(Arc::new(classifier));

        let assessment = service.assess(&fixtures::healthy()).expect("assess");
        assert_eq!(assessment.label, RiskLabel::Low);
        assert_eq!(assessment.probability, None);
    }

    #[test]
    fn test_out_of_range_probability_is_rejected() {
        let service =
            AssessmentService::new(Arc::new(FixedClassifier::new(RiskLabel::Low, Some(1.5))));
        assert!(matches!(
            service.assess(&fixtures::healthy()),
            Err(CardioError::ModelUnavailable(ModelError::Malformed(_)))
        ));
    }
}
