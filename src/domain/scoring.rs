//! Heart-health score: a 0-7 wellness count computed without the classifier.
//!
//! One point per satisfied predicate, unweighted:
//! non-smoker, non-drinker, active, BMI in [18.5, 24.9], normal cholesterol,
//! normal glucose, and blood pressure below 130/80 on both readings.

use serde::{Deserialize, Serialize};

use super::patient::PatientProfile;

/// Maximum attainable heart-health score.
pub const MAX_HEART_SCORE: u8 = 7;

/// Healthy BMI band, inclusive on both ends.
pub const HEALTHY_BMI_MIN: f64 = 18.5;
pub const HEALTHY_BMI_MAX: f64 = 24.9;

/// Blood pressure must be strictly below both bounds to earn the point.
pub const OPTIMAL_SYSTOLIC_BELOW: u32 = 130;
pub const OPTIMAL_DIASTOLIC_BELOW: u32 = 80;

/// Body-mass index from height in cm and weight in kg.
#[must_use]
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// The seven scored predicates, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScorePoint {
    NonSmoker,
    NonDrinker,
    PhysicallyActive,
    HealthyBmi,
    NormalCholesterol,
    NormalGlucose,
    OptimalBloodPressure,
}

impl ScorePoint {
    pub const ALL: [ScorePoint; 7] = [
        Self::NonSmoker,
        Self::NonDrinker,
        Self::PhysicallyActive,
        Self::HealthyBmi,
        Self::NormalCholesterol,
        Self::NormalGlucose,
        Self::OptimalBloodPressure,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NonSmoker => "Non-smoker",
            Self::NonDrinker => "No alcohol",
            Self::PhysicallyActive => "Physically active",
            Self::HealthyBmi => "BMI 18.5-24.9",
            Self::NormalCholesterol => "Normal cholesterol",
            Self::NormalGlucose => "Normal glucose",
            Self::OptimalBloodPressure => "BP below 130/80",
        }
    }

    fn earned(self, profile: &PatientProfile, bmi: f64) -> bool {
        match self {
            Self::NonSmoker => !profile.smoker,
            Self::NonDrinker => !profile.drinks_alcohol,
            Self::PhysicallyActive => profile.physically_active,
            Self::HealthyBmi => (HEALTHY_BMI_MIN..=HEALTHY_BMI_MAX).contains(&bmi),
            Self::NormalCholesterol => profile.cholesterol.is_normal(),
            Self::NormalGlucose => profile.glucose.is_normal(),
            Self::OptimalBloodPressure => {
                profile.systolic < OPTIMAL_SYSTOLIC_BELOW
                    && profile.diastolic < OPTIMAL_DIASTOLIC_BELOW
            }
        }
    }
}

/// Result of the heart-score engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartScore {
    score: u8,
    bmi: f64,
    earned: [bool; 7],
}

impl HeartScore {
    /// Score in `0..=7`.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    /// Each predicate paired with whether it earned a point.
    pub fn points(&self) -> impl Iterator<Item = (ScorePoint, bool)> + '_ {
        ScorePoint::ALL.iter().copied().zip(self.earned.iter().copied())
    }
}

/// Compute the heart-health score and BMI for a profile.
#[must_use]
pub fn score(profile: &PatientProfile) -> HeartScore {
    let bmi = profile.bmi();
    let earned = ScorePoint::ALL.map(|point| point.earned(profile, bmi));
    let score = earned.iter().filter(|e| **e).count() as u8;

    HeartScore { score, bmi, earned }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::fixtures::{healthy, high_risk};
    use crate::domain::patient::ClinicalLevel;

    #[test]
    fn test_bmi_reference_value() {
        let value = bmi(170.0, 70.0);
        assert!((value - 24.22).abs() < 0.01, "bmi was {value}");
    }

    #[test]
    fn test_healthy_profile_scores_full() {
        let result = score(&healthy());
        assert_eq!(result.score(), MAX_HEART_SCORE);
        assert!(result.points().all(|(_, earned)| earned));
    }

    #[test]
    fn test_high_risk_profile_scores_zero() {
        let result = score(&high_risk());
        assert_eq!(result.score(), 0);
        assert!((result.bmi() - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_bp_boundary_is_strict() {
        let mut profile = healthy();
        profile.systolic = 130;
        profile.diastolic = 80;
        let result = score(&profile);
        assert_eq!(result.score(), 6);
        let bp = result
            .points()
            .find(|(p, _)| *p == ScorePoint::OptimalBloodPressure)
            .map(|(_, earned)| earned);
        assert_eq!(bp, Some(false));

        profile.systolic = 129;
        assert_eq!(score(&profile).score(), 6, "diastolic 80 alone still fails");

        profile.diastolic = 79;
        assert_eq!(score(&profile).score(), 7);
    }

    #[test]
    fn test_bmi_band_is_inclusive() {
        let mut profile = healthy();
        profile.height_cm = 200.0;

        profile.weight_kg = 74.0; // 18.5
        assert_eq!(score(&profile).score(), 7);

        profile.weight_kg = 99.6; // 24.9
        assert_eq!(score(&profile).score(), 7);

        profile.weight_kg = 100.0; // 25.0
        assert_eq!(score(&profile).score(), 6);
    }

    #[test]
    fn test_score_is_sum_of_independent_points() {
        let mut profile = healthy();
        profile.cholesterol = ClinicalLevel::AboveNormal;
        profile.drinks_alcohol = true;
        let result = score(&profile);
        assert_eq!(result.score(), 5);
        assert_eq!(result.points().filter(|(_, e)| *e).count(), 5);
        assert_eq!(score(&profile), result);
    }
}
