//! Contributing risk factors.
//!
//! Named markers shown next to the prediction. They use their own cut-offs,
//! which are looser than the insight rules, and do not affect the label,
//! probability or heart score.

use std::fmt;

use serde::Serialize;

use super::patient::{ClinicalLevel, PatientProfile};

/// Age above which age counts as a factor.
pub const AGE_FACTOR_ABOVE: u32 = 50;

/// BMI above which obesity counts as a factor.
pub const OBESITY_BMI_ABOVE: f64 = 30.0;

/// Blood pressure above which hypertension counts as a factor.
pub const HYPERTENSION_SYSTOLIC_ABOVE: u32 = 140;
pub const HYPERTENSION_DIASTOLIC_ABOVE: u32 = 90;

/// Shown instead of the list when no factor applies.
pub const OPTIMAL_VITALS: &str = "Optimal Vitals";
pub const OPTIMAL_VITALS_DETAIL: &str = "All markers are within healthy ranges.";

/// A marker contributing to elevated risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ContributingFactor {
    AgeOver50,
    Obesity { bmi: f64 },
    Hypertension,
    CriticallyHighCholesterol,
    ElevatedCholesterol,
    ElevatedGlucose,
    Smoker,
    SedentaryLifestyle,
}

impl fmt::Display for ContributingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgeOver50 => write!(f, "Age > {AGE_FACTOR_ABOVE}"),
            Self::Obesity { bmi } => write!(f, "Obesity (BMI {bmi:.1})"),
            Self::Hypertension => f.write_str("Hypertension"),
            Self::CriticallyHighCholesterol => f.write_str("Critically High Cholesterol"),
            Self::ElevatedCholesterol => f.write_str("Elevated Cholesterol"),
            Self::ElevatedGlucose => f.write_str("Elevated Glucose"),
            Self::Smoker => f.write_str("Smoker"),
            Self::SedentaryLifestyle => f.write_str("Sedentary Lifestyle"),
        }
    }
}

/// List the factors that apply to `profile`, in display order.
///
/// An empty list means the optimal-vitals fallback is shown.
#[must_use]
pub fn contributing_factors(profile: &PatientProfile) -> Vec<ContributingFactor> {
    let mut factors = Vec::new();

    if profile.age_years > AGE_FACTOR_ABOVE {
        factors.push(ContributingFactor::AgeOver50);
    }

    let bmi = profile.bmi();
    if bmi > OBESITY_BMI_ABOVE {
        factors.push(ContributingFactor::Obesity { bmi });
    }

    if profile.systolic > HYPERTENSION_SYSTOLIC_ABOVE
        || profile.diastolic > HYPERTENSION_DIASTOLIC_ABOVE
    {
        factors.push(ContributingFactor::Hypertension);
    }

    match profile.cholesterol {
        ClinicalLevel::High => factors.push(ContributingFactor::CriticallyHighCholesterol),
        ClinicalLevel::AboveNormal => factors.push(ContributingFactor::ElevatedCholesterol),
        ClinicalLevel::Normal => {}
    }

    if !profile.glucose.is_normal() {
        factors.push(ContributingFactor::ElevatedGlucose);
    }
    if profile.smoker {
        factors.push(ContributingFactor::Smoker);
    }
    if !profile.physically_active {
        factors.push(ContributingFactor::SedentaryLifestyle);
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::fixtures::{healthy, high_risk};

    fn labels(profile: &PatientProfile) -> Vec<String> {
        contributing_factors(profile)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_high_risk_factor_order() {
        assert_eq!(
            labels(&high_risk()),
            vec![
                "Age > 50",
                "Hypertension",
                "Critically High Cholesterol",
                "Elevated Glucose",
                "Smoker",
                "Sedentary Lifestyle",
            ]
        );
    }

    #[test]
    fn test_healthy_profile_has_no_factors() {
        assert!(contributing_factors(&healthy()).is_empty());
    }

    #[test]
    fn test_boundaries_are_strict() {
        let mut profile = healthy();
        profile.age_years = 50;
        profile.height_cm = 200.0;
        profile.weight_kg = 120.0;
        profile.systolic = 140;
        profile.diastolic = 90;
        assert!((profile.bmi() - 30.0).abs() < 1e-9);
        assert!(contributing_factors(&profile).is_empty());

        profile.age_years = 51;
        profile.weight_kg = 124.8;
        profile.systolic = 141;
        assert_eq!(
            labels(&profile),
            vec!["Age > 50", "Obesity (BMI 31.2)", "Hypertension"]
        );
    }

    #[test]
    fn test_diastolic_alone_triggers_hypertension() {
        let mut profile = healthy();
        profile.diastolic = 91;
        assert_eq!(
            contributing_factors(&profile),
            vec![ContributingFactor::Hypertension]
        );
    }

    #[test]
    fn test_cholesterol_levels_use_distinct_wording() {
        let mut profile = healthy();
        profile.cholesterol = ClinicalLevel::AboveNormal;
        assert_eq!(labels(&profile), vec!["Elevated Cholesterol"]);

        profile.cholesterol = ClinicalLevel::High;
        assert_eq!(labels(&profile), vec!["Critically High Cholesterol"]);
    }

    #[test]
    fn test_alcohol_is_not_a_factor() {
        let mut profile = healthy();
        profile.drinks_alcohol = true;
        assert!(contributing_factors(&profile).is_empty());
    }
}
