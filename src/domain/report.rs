//! Structured clinical report.
//!
//! A [`ClinicalReport`] is the renderer-independent form of the downloadable
//! document. It is built once from a profile and a finished assessment, then
//! rendered to text (screen) or PDF (download).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::assessment::RiskAssessment;
use super::factors::{contributing_factors, OPTIMAL_VITALS, OPTIMAL_VITALS_DETAIL};
use super::patient::PatientProfile;
use super::scoring::MAX_HEART_SCORE;

/// Report title line.
pub const REPORT_TITLE: &str = "CardioCare - Clinical Report";

/// Maximum number of recommendations printed in a report.
pub const MAX_REPORT_RECOMMENDATIONS: usize = 8;

/// Fixed footer.
pub const DISCLAIMER: &str =
    "Disclaimer: Educational purposes only. Not a substitute for medical advice.";

/// Error type for report composition and export.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Assessment is incomplete: {0}")]
    IncompleteAssessment(&'static str),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A titled block of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub heading: &'static str,
    pub lines: Vec<String>,
}

/// Renderer-independent clinical report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalReport {
    pub title: &'static str,
    pub generated_at: DateTime<Utc>,
    pub headline: &'static str,
    /// Optional line under the headline (model probability)
    pub probability_line: Option<String>,
    pub heart_score_line: String,
    pub patient: ReportSection,
    /// Named factors, or the optimal-vitals line when none apply
    pub factors: ReportSection,
    /// Present only when the patient has risk enhancers
    pub risk_enhancers: Option<ReportSection>,
    pub recommendations: ReportSection,
    pub disclaimer: &'static str,
}

impl ClinicalReport {
    /// Assemble the report sections.
    ///
    /// # Errors
    /// Returns `ReportError::IncompleteAssessment` when a field needed by the
    /// document is missing or not renderable.
    pub fn build(
        profile: &PatientProfile,
        assessment: &RiskAssessment,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ReportError> {
        check_complete(assessment)?;

        let probability_line = assessment
            .probability
            .map(|p| format!("Model probability: {:.1}%", p * 100.0));

        let patient = ReportSection {
            heading: "Patient Information:",
            lines: vec![
                format!("Age: {} years", profile.age_years),
                format!("Sex: {}", profile.sex),
                format!(
                    "Height: {} cm | Weight: {} kg",
                    trim_number(profile.height_cm),
                    trim_number(profile.weight_kg)
                ),
                format!("BMI: {:.1}", assessment.bmi),
                format!(
                    "Blood Pressure: {}/{} mmHg",
                    profile.systolic, profile.diastolic
                ),
                format!(
                    "Cholesterol: {} | Glucose: {}",
                    profile.cholesterol, profile.glucose
                ),
                format!(
                    "Lifestyle: {} | {} | {}",
                    if profile.smoker { "Smoker" } else { "Non-smoker" },
                    if profile.drinks_alcohol { "Drinks alcohol" } else { "No alcohol" },
                    if profile.physically_active { "Physically active" } else { "Inactive" },
                ),
            ],
        };

        let factors = contributing_factors(profile);
        let factors = ReportSection {
            heading: "Contributing Factors:",
            lines: if factors.is_empty() {
                vec![format!("{OPTIMAL_VITALS}: {OPTIMAL_VITALS_DETAIL}")]
            } else {
                factors.iter().map(ToString::to_string).collect()
            },
        };

        let risk_enhancers = if assessment.risk_enhancers.is_empty() {
            None
        } else {
            Some(ReportSection {
                heading: "Clinical Risk Enhancers:",
                lines: assessment
                    .risk_enhancers
                    .iter()
                    .map(|e| e.label().to_string())
                    .collect(),
            })
        };

        let recommendations = ReportSection {
            heading: "Recommendations:",
            lines: assessment
                .insights
                .iter()
                .take(MAX_REPORT_RECOMMENDATIONS)
                .map(|i| i.message.clone())
                .collect(),
        };

        Ok(Self {
            title: REPORT_TITLE,
            generated_at,
            headline: assessment.label.headline(),
            probability_line,
            heart_score_line: format!(
                "Heart Health Score: {}/{}",
                assessment.heart_score, MAX_HEART_SCORE
            ),
            patient,
            factors,
            risk_enhancers,
            recommendations,
            disclaimer: DISCLAIMER,
        })
    }

    /// Generation timestamp as printed in the header.
    #[must_use]
    pub fn generated_line(&self) -> String {
        format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))
    }

    /// Sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &ReportSection> {
        [&self.patient, &self.factors]
            .into_iter()
            .chain(self.risk_enhancers.as_ref())
            .chain(std::iter::once(&self.recommendations))
    }
}

impl fmt::Display for ClinicalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.generated_line())?;
        writeln!(f)?;
        writeln!(f, "{}", self.headline)?;
        if let Some(line) = &self.probability_line {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{}", self.heart_score_line)?;
        for section in self.sections() {
            writeln!(f)?;
            writeln!(f, "{}", section.heading)?;
            for line in &section.lines {
                writeln!(f, "- {line}")?;
            }
        }
        writeln!(f)?;
        write!(f, "{}", self.disclaimer)
    }
}

fn check_complete(assessment: &RiskAssessment) -> Result<(), ReportError> {
    if !assessment.bmi.is_finite() || assessment.bmi <= 0.0 {
        return Err(ReportError::IncompleteAssessment("bmi"));
    }
    if assessment.heart_score > MAX_HEART_SCORE {
        return Err(ReportError::IncompleteAssessment("heart_score"));
    }
    if let Some(p) = assessment.probability {
        if !(0.0..=1.0).contains(&p) {
            return Err(ReportError::IncompleteAssessment("probability"));
        }
    }
    if assessment.insights.is_empty() {
        return Err(ReportError::IncompleteAssessment("insights"));
    }
    Ok(())
}

/// Print whole numbers without a trailing `.0`.
fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::assessment::RiskLabel;
    use crate::domain::insights::{generate_insights, InsightInputs};
    use crate::domain::scoring;

    pub fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).single().expect("valid time")
    }

    /// Build an assessment the way the pipeline does, with a chosen label.
    pub fn assessment_for(profile: &PatientProfile, label: RiskLabel) -> RiskAssessment {
        let heart = scoring::score(profile);
        let inputs = InsightInputs::from_profile(profile, heart.bmi());
        RiskAssessment {
            label,
            probability: Some(0.82),
            heart_score: heart.score(),
            bmi: heart.bmi(),
            insights: generate_insights(label, &inputs, &profile.risk_enhancers),
            risk_enhancers: profile.risk_enhancers.clone(),
            assessed_at: fixed_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::assessment::RiskLabel;
    use crate::domain::patient::fixtures::{healthy, high_risk};
    use crate::domain::patient::RiskEnhancer;

    #[test]
    fn test_build_high_risk_report() {
        let profile = high_risk();
        let assessment = assessment_for(&profile, RiskLabel::High);
        let report = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");

        assert_eq!(report.headline, "HIGH CARDIOVASCULAR RISK");
        assert_eq!(report.heart_score_line, "Heart Health Score: 0/7");
        assert_eq!(report.probability_line.as_deref(), Some("Model probability: 82.0%"));
        assert_eq!(report.generated_line(), "Generated: 2024-03-14 09:26:53 UTC");
        assert!(report.risk_enhancers.is_none());
        assert_eq!(report.recommendations.lines.len(), 8);
        assert_eq!(
            report.factors.lines,
            vec![
                "Age > 50",
                "Hypertension",
                "Critically High Cholesterol",
                "Elevated Glucose",
                "Smoker",
                "Sedentary Lifestyle",
            ]
        );
        assert_eq!(
            report.patient.lines,
            vec![
                "Age: 58 years",
                "Sex: Male",
                "Height: 175 cm | Weight: 85.8 kg",
                "BMI: 28.0",
                "Blood Pressure: 150/95 mmHg",
                "Cholesterol: High | Glucose: Above Normal",
                "Lifestyle: Smoker | Drinks alcohol | Inactive",
            ]
        );
    }

    #[test]
    fn test_recommendations_are_capped() {
        let profile = high_risk().with_enhancers([RiskEnhancer::KidneyDisease]);
        let assessment = assessment_for(&profile, RiskLabel::High);
        assert_eq!(assessment.insights.len(), 9);

        let report = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");
        assert_eq!(report.recommendations.lines.len(), MAX_REPORT_RECOMMENDATIONS);
        assert_eq!(
            report.recommendations.lines[..],
            assessment.insight_messages()[..MAX_REPORT_RECOMMENDATIONS]
        );
        let enhancers = report.risk_enhancers.expect("enhancer block");
        assert_eq!(enhancers.lines, vec!["Chronic Kidney Disease"]);
    }

    #[test]
    fn test_sections_skip_empty_enhancers() {
        let profile = healthy();
        let assessment = assessment_for(&profile, RiskLabel::Low);
        let report = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");
        let headings: Vec<&str> = report.sections().map(|s| s.heading).collect();
        assert_eq!(
            headings,
            vec!["Patient Information:", "Contributing Factors:", "Recommendations:"]
        );
        assert_eq!(
            report.factors.lines,
            vec!["Optimal Vitals: All markers are within healthy ranges."]
        );
    }

    #[test]
    fn test_factors_precede_enhancers() {
        let profile = high_risk().with_enhancers([RiskEnhancer::FamilyHistory]);
        let assessment = assessment_for(&profile, RiskLabel::High);
        let report = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");
        let headings: Vec<&str> = report.sections().map(|s| s.heading).collect();
        assert_eq!(
            headings,
            vec![
                "Patient Information:",
                "Contributing Factors:",
                "Clinical Risk Enhancers:",
                "Recommendations:",
            ]
        );
    }

    #[test]
    fn test_incomplete_assessment_is_rejected() {
        let profile = healthy();
        let mut assessment = assessment_for(&profile, RiskLabel::Low);
        assessment.bmi = f64::NAN;
        assert!(matches!(
            ClinicalReport::build(&profile, &assessment, fixed_time()),
            Err(ReportError::IncompleteAssessment("bmi"))
        ));

        let mut assessment = assessment_for(&profile, RiskLabel::Low);
        assessment.insights.clear();
        assert!(matches!(
            ClinicalReport::build(&profile, &assessment, fixed_time()),
            Err(ReportError::IncompleteAssessment("insights"))
        ));
    }

    #[test]
    fn test_text_rendering_is_stable() {
        let profile = healthy().with_enhancers([RiskEnhancer::FamilyHistory]);
        let assessment = assessment_for(&profile, RiskLabel::Low);
        let a = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");
        let b = ClinicalReport::build(&profile, &assessment, fixed_time()).expect("build");
        assert_eq!(a.to_string(), b.to_string());

        let text = a.to_string();
        assert!(text.starts_with("CardioCare - Clinical Report\nGenerated: 2024-03-14"));
        assert!(text.contains("Clinical Risk Enhancers:\n- Family History of Heart Disease"));
        assert!(text.ends_with(DISCLAIMER));
    }
}
