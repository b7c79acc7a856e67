//! Feature encoding for the CardioTrain classifier.
//!
//! The column order here is the model contract. Changing it (or the unit
//! conversions) invalidates every artifact trained against it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patient::PatientProfile;

/// Days per year used for the age column (no leap-year adjustment).
pub const DAYS_PER_YEAR: u32 = 365;

/// Column names of the standard CardioTrain layout, in model order.
pub const STANDARD_FEATURE_NAMES: [&str; 11] = [
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
];

/// Column names of the BMI-augmented layout, in model order.
pub const WITH_BMI_FEATURE_NAMES: [&str; 12] = [
    "age",
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "bmi",
];

/// Versioned column layout a classifier artifact was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLayout {
    /// 11 CardioTrain columns
    #[default]
    Standard,
    /// 11 CardioTrain columns followed by BMI
    WithBmi,
}

impl FeatureLayout {
    #[must_use]
    pub fn feature_names(self) -> &'static [&'static str] {
        match self {
            Self::Standard => &STANDARD_FEATURE_NAMES,
            Self::WithBmi => &WITH_BMI_FEATURE_NAMES,
        }
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.feature_names().len()
    }
}

impl fmt::Display for FeatureLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::WithBmi => write!(f, "with_bmi"),
        }
    }
}

impl FromStr for FeatureLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "with_bmi" | "with-bmi" | "bmi" => Ok(Self::WithBmi),
            other => Err(format!("unknown feature layout '{other}' (expected standard or with_bmi)")),
        }
    }
}

/// Ordered numeric encoding of one profile, tagged with its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    layout: FeatureLayout,
    values: Vec<f64>,
}

impl FeatureVector {
    #[must_use]
    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column, if the layout has it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.layout
            .feature_names()
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encode a validated profile into the given layout.
///
/// Assumes the profile already passed [`PatientProfile::validate`].
#[must_use]
pub fn encode(profile: &PatientProfile, layout: FeatureLayout) -> FeatureVector {
    let mut values = Vec::with_capacity(layout.len());
    values.extend_from_slice(&[
        f64::from(profile.age_years) * f64::from(DAYS_PER_YEAR),
        profile.sex.code(),
        profile.height_cm,
        profile.weight_kg,
        f64::from(profile.systolic),
        f64::from(profile.diastolic),
        f64::from(profile.cholesterol.ordinal()),
        f64::from(profile.glucose.ordinal()),
        flag(profile.smoker),
        flag(profile.drinks_alcohol),
        flag(profile.physically_active),
    ]);

    if layout == FeatureLayout::WithBmi {
        values.push(profile.bmi());
    }

    FeatureVector { layout, values }
}
