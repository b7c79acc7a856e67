//! Domain layer: Core business types and logic.
//!
//! Everything here is pure and deterministic: encoding, scoring, factor and
//! insight rules and report assembly take all their inputs as parameters.

mod assessment;
pub mod factors;
pub mod features;
pub mod insights;
mod patient;
pub mod report;
pub mod scoring;

pub use assessment::{RiskAssessment, RiskLabel};
pub use factors::{contributing_factors, ContributingFactor};
pub use features::{encode, FeatureLayout, FeatureVector};
pub use insights::{generate_insights, Insight, InsightInputs, InsightSeverity};
pub use patient::{
    BiologicalSex, ClinicalLevel, FieldRange, PatientProfile, RiskEnhancer, AGE_RANGE,
    DIASTOLIC_RANGE, FIELD_RANGES, HEIGHT_RANGE, SYSTOLIC_RANGE, WEIGHT_RANGE,
};
pub use report::{ClinicalReport, ReportError};
pub use scoring::{score, HeartScore, ScorePoint};

#[cfg(test)]
pub(crate) use patient::fixtures;
