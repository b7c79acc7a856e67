//! Rule-based health insights.
//!
//! The list is ordered: the headline message first, then each triggered
//! recommendation in a fixed priority order. Rules fire independently.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::assessment::RiskLabel;
use super::patient::{ClinicalLevel, PatientProfile, RiskEnhancer};

/// Hypertension trigger for the high-risk blood-pressure message.
pub const HYPERTENSIVE_SYSTOLIC: u32 = 140;
pub const HYPERTENSIVE_DIASTOLIC: u32 = 90;

/// BMI above which high-risk patients get weight guidance.
pub const HIGH_RISK_BMI_TRIGGER: f64 = 25.0;

/// BMI above which low-risk patients get a weight suggestion.
pub const LOW_RISK_BMI_TRIGGER: f64 = 24.9;

const URGENT_CONSULTATION: &str = "HIGH RISK: Consult a healthcare professional promptly.";
const QUIT_SMOKING: &str = "QUIT SMOKING: Reduces heart disease risk by 50% within one year.";
const MANAGE_BP: &str = "MANAGE BP: Reduce sodium, increase potassium-rich foods.";
const LOWER_CHOLESTEROL: &str = "LOWER CHOLESTEROL: Reduce saturated fats, increase fiber.";
const CONTROL_GLUCOSE: &str = "CONTROL GLUCOSE: Limit refined sugars and carbs.";
const EXERCISE: &str = "EXERCISE: Aim for 150 minutes/week of moderate activity.";
const REDUCE_ALCOHOL: &str = "REDUCE ALCOHOL: Limit or eliminate consumption.";
const MAINTAIN_HABITS: &str = "LOW RISK: Keep up your current heart-healthy habits.";
const MAINTAIN_WEIGHT: &str = "Consider maintaining optimal weight.";
const ADD_ACTIVITY: &str = "Add regular physical activity for optimal health.";

/// How an insight should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightSeverity {
    /// Needs attention (urgent consultation, additional risk factors)
    Warning,
    /// Lifestyle guidance
    Info,
    /// Positive reinforcement
    Success,
}

/// One human-readable finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: InsightSeverity,
    pub message: String,
}

impl Insight {
    fn new(severity: InsightSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Profile-derived values the rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightInputs {
    pub bmi: f64,
    pub systolic: u32,
    pub diastolic: u32,
    pub cholesterol: ClinicalLevel,
    pub glucose: ClinicalLevel,
    pub smoker: bool,
    pub drinks_alcohol: bool,
    pub physically_active: bool,
}

impl InsightInputs {
    /// Collect the inputs from a profile and its already-computed BMI.
    #[must_use]
    pub fn from_profile(profile: &PatientProfile, bmi: f64) -> Self {
        Self {
            bmi,
            systolic: profile.systolic,
            diastolic: profile.diastolic,
            cholesterol: profile.cholesterol,
            glucose: profile.glucose,
            smoker: profile.smoker,
            drinks_alcohol: profile.drinks_alcohol,
            physically_active: profile.physically_active,
        }
    }
}

/// Generate the ordered insight list for a prediction.
#[must_use]
pub fn generate_insights(
    label: RiskLabel,
    inputs: &InsightInputs,
    enhancers: &[RiskEnhancer],
) -> Vec<Insight> {
    use InsightSeverity::{Info, Success, Warning};

    let mut insights = Vec::new();

    match label {
        RiskLabel::High => {
            insights.push(Insight::new(Warning, URGENT_CONSULTATION));

            if inputs.smoker {
                insights.push(Insight::new(Info, QUIT_SMOKING));
            }
            if inputs.systolic >= HYPERTENSIVE_SYSTOLIC || inputs.diastolic >= HYPERTENSIVE_DIASTOLIC {
                insights.push(Insight::new(Info, MANAGE_BP));
            }
            if inputs.bmi > HIGH_RISK_BMI_TRIGGER {
                insights.push(Insight::new(
                    Info,
                    format!("WEIGHT MANAGEMENT: BMI {:.1}. Aim for 18.5-24.9.", inputs.bmi),
                ));
            }
            if !inputs.cholesterol.is_normal() {
                insights.push(Insight::new(Info, LOWER_CHOLESTEROL));
            }
            if !inputs.glucose.is_normal() {
                insights.push(Insight::new(Info, CONTROL_GLUCOSE));
            }
            if !inputs.physically_active {
                insights.push(Insight::new(Info, EXERCISE));
            }
            if inputs.drinks_alcohol {
                insights.push(Insight::new(Info, REDUCE_ALCOHOL));
            }
            if !enhancers.is_empty() {
                insights.push(Insight::new(
                    Warning,
                    format!(
                        "ADDITIONAL RISK FACTORS: {} clinical enhancer(s) identified.",
                        enhancers.len()
                    ),
                ));
            }
        }
        RiskLabel::Low => {
            insights.push(Insight::new(Success, MAINTAIN_HABITS));

            if inputs.bmi > LOW_RISK_BMI_TRIGGER {
                insights.push(Insight::new(Info, MAINTAIN_WEIGHT));
            }
            if !inputs.physically_active {
                insights.push(Insight::new(Info, ADD_ACTIVITY));
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::fixtures::{healthy, high_risk};

    fn messages(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.message.as_str()).collect()
    }

    #[test]
    fn test_high_risk_full_order() {
        let profile = high_risk();
        let inputs = InsightInputs::from_profile(&profile, profile.bmi());
        let insights = generate_insights(RiskLabel::High, &inputs, &[]);

        assert_eq!(
            messages(&insights),
            vec![
                URGENT_CONSULTATION,
                QUIT_SMOKING,
                MANAGE_BP,
                "WEIGHT MANAGEMENT: BMI 28.0. Aim for 18.5-24.9.",
                LOWER_CHOLESTEROL,
                CONTROL_GLUCOSE,
                EXERCISE,
                REDUCE_ALCOHOL,
            ]
        );
        assert_eq!(insights[0].severity, InsightSeverity::Warning);
        assert!(insights[1..].iter().all(|i| i.severity == InsightSeverity::Info));
    }

    #[test]
    fn test_high_risk_enhancer_summary_is_last() {
        let profile = high_risk();
        let inputs = InsightInputs::from_profile(&profile, profile.bmi());
        let enhancers = [RiskEnhancer::FamilyHistory, RiskEnhancer::KidneyDisease];
        let insights = generate_insights(RiskLabel::High, &inputs, &enhancers);

        assert_eq!(insights.len(), 9);
        let last = insights.last().expect("non-empty");
        assert_eq!(
            last.message,
            "ADDITIONAL RISK FACTORS: 2 clinical enhancer(s) identified."
        );
        assert_eq!(last.severity, InsightSeverity::Warning);
    }

    #[test]
    fn test_high_risk_rules_fire_independently() {
        let mut profile = healthy();
        profile.diastolic = 90;
        profile.drinks_alcohol = true;
        let inputs = InsightInputs::from_profile(&profile, profile.bmi());
        let insights = generate_insights(RiskLabel::High, &inputs, &[]);

        assert_eq!(
            messages(&insights),
            vec![URGENT_CONSULTATION, MANAGE_BP, REDUCE_ALCOHOL]
        );
    }

    #[test]
    fn test_bmi_exactly_25_does_not_trigger_high_risk_weight() {
        let mut inputs = InsightInputs::from_profile(&healthy(), 25.0);
        inputs.physically_active = true;
        let insights = generate_insights(RiskLabel::High, &inputs, &[]);
        assert_eq!(messages(&insights), vec![URGENT_CONSULTATION]);
    }

    #[test]
    fn test_low_risk_relaxed_thresholds() {
        let mut profile = healthy();
        profile.physically_active = false;
        let inputs = InsightInputs::from_profile(&profile, 24.95);
        let insights = generate_insights(RiskLabel::Low, &inputs, &[RiskEnhancer::FamilyHistory]);

        assert_eq!(
            messages(&insights),
            vec![MAINTAIN_HABITS, MAINTAIN_WEIGHT, ADD_ACTIVITY]
        );
        assert_eq!(insights[0].severity, InsightSeverity::Success);
    }

    #[test]
    fn test_low_risk_healthy_only_maintenance() {
        let profile = healthy();
        let inputs = InsightInputs::from_profile(&profile, profile.bmi());
        let insights = generate_insights(RiskLabel::Low, &inputs, &[]);
        assert_eq!(messages(&insights), vec![MAINTAIN_HABITS]);
    }
}
