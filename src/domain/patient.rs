//! Patient profile types for cardiovascular risk assessment.
//!
//! Fields follow the CardioTrain examination record: anthropometrics, blood
//! pressure, two ordinal lab levels and three lifestyle flags, plus optional
//! clinical risk enhancers that are reported but never fed to the model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-valued biological sex as recorded on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiologicalSex {
    Female,
    Male,
}

impl BiologicalSex {
    /// Numeric code used in the model's `gender` column.
    ///
    /// Female = 1, Male = 2. Every encoder call site goes through this method.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Female => 1.0,
            Self::Male => 2.0,
        }
    }
}

impl fmt::Display for BiologicalSex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => write!(f, "Female"),
            Self::Male => write!(f, "Male"),
        }
    }
}

/// Ordinal lab level (cholesterol, glucose): 1 = normal, 2 = above normal, 3 = high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClinicalLevel {
    Normal,
    AboveNormal,
    High,
}

impl ClinicalLevel {
    /// Ordinal value as used by the model (1..=3).
    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::AboveNormal => 2,
            Self::High => 3,
        }
    }

    /// Parse an ordinal value.
    ///
    /// # Errors
    /// Returns a message when the ordinal is outside 1..=3.
    pub fn from_ordinal(value: u8) -> Result<Self, String> {
        match value {
            1 => Ok(Self::Normal),
            2 => Ok(Self::AboveNormal),
            3 => Ok(Self::High),
            other => Err(format!("Ordinal level {other} out of range [1, 3]")),
        }
    }

    #[must_use]
    pub fn is_normal(self) -> bool {
        self == Self::Normal
    }
}

impl fmt::Display for ClinicalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::AboveNormal => write!(f, "Above Normal"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Named clinical condition tracked outside the modeled features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskEnhancer {
    FamilyHistory,
    KidneyDisease,
    MetabolicSyndrome,
    InflammatoryConditions,
}

impl RiskEnhancer {
    /// All enhancers in canonical display order.
    pub const ALL: [RiskEnhancer; 4] = [
        Self::FamilyHistory,
        Self::KidneyDisease,
        Self::MetabolicSyndrome,
        Self::InflammatoryConditions,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FamilyHistory => "Family History of Heart Disease",
            Self::KidneyDisease => "Chronic Kidney Disease",
            Self::MetabolicSyndrome => "Metabolic Syndrome",
            Self::InflammatoryConditions => "Chronic Inflammatory Conditions",
        }
    }
}

impl fmt::Display for RiskEnhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared input range for a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && (self.min..=self.max).contains(&value)
    }

    fn check(&self, value: f64, errors: &mut Vec<String>) {
        if !self.contains(value) {
            errors.push(format!(
                "{} {} out of range [{}, {}] {}",
                self.name, value, self.min, self.max, self.unit
            ));
        }
    }
}

pub const AGE_RANGE: FieldRange = FieldRange { name: "Age", unit: "years", min: 1.0, max: 120.0 };
pub const HEIGHT_RANGE: FieldRange = FieldRange { name: "Height", unit: "cm", min: 100.0, max: 250.0 };
pub const WEIGHT_RANGE: FieldRange = FieldRange { name: "Weight", unit: "kg", min: 30.0, max: 250.0 };
pub const SYSTOLIC_RANGE: FieldRange = FieldRange { name: "Systolic BP", unit: "mmHg", min: 80.0, max: 220.0 };
pub const DIASTOLIC_RANGE: FieldRange = FieldRange { name: "Diastolic BP", unit: "mmHg", min: 40.0, max: 120.0 };

/// Every numeric range, in form order.
pub const FIELD_RANGES: [FieldRange; 5] = [
    AGE_RANGE,
    HEIGHT_RANGE,
    WEIGHT_RANGE,
    SYSTOLIC_RANGE,
    DIASTOLIC_RANGE,
];

/// One patient's clinical measurements for a single assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Age in whole years
    pub age_years: u32,

    pub sex: BiologicalSex,

    /// Height in centimetres
    pub height_cm: f64,

    /// Weight in kilograms
    pub weight_kg: f64,

    /// Systolic blood pressure (mmHg)
    pub systolic: u32,

    /// Diastolic blood pressure (mmHg)
    pub diastolic: u32,

    pub cholesterol: ClinicalLevel,
    pub glucose: ClinicalLevel,

    pub smoker: bool,
    pub drinks_alcohol: bool,
    pub physically_active: bool,

    /// Active risk enhancers; kept sorted and de-duplicated by [`PatientProfile::with_enhancers`]
    #[serde(default)]
    pub risk_enhancers: Vec<RiskEnhancer>,
}

impl PatientProfile {
    /// Replace the risk enhancers, normalizing them to canonical order.
    #[must_use]
    pub fn with_enhancers(mut self, enhancers: impl IntoIterator<Item = RiskEnhancer>) -> Self {
        let mut list: Vec<RiskEnhancer> = enhancers.into_iter().collect();
        list.sort();
        list.dedup();
        self.risk_enhancers = list;
        self
    }

    /// Body-mass index in kg/m².
    #[must_use]
    pub fn bmi(&self) -> f64 {
        crate::domain::scoring::bmi(self.height_cm, self.weight_kg)
    }

    /// Validate every field against its declared range.
    ///
    /// # Errors
    /// Returns all violations, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        AGE_RANGE.check(f64::from(self.age_years), &mut errors);
        HEIGHT_RANGE.check(self.height_cm, &mut errors);
        WEIGHT_RANGE.check(self.weight_kg, &mut errors);
        SYSTOLIC_RANGE.check(f64::from(self.systolic), &mut errors);
        DIASTOLIC_RANGE.check(f64::from(self.diastolic), &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Healthy 35-year-old, 170 cm / 70 kg, 120/78.
    pub fn healthy() -> PatientProfile {
        PatientProfile {
            age_years: 35,
            sex: BiologicalSex::Female,
            height_cm: 170.0,
            weight_kg: 70.0,
            systolic: 120,
            diastolic: 78,
            cholesterol: ClinicalLevel::Normal,
            glucose: ClinicalLevel::Normal,
            smoker: false,
            drinks_alcohol: false,
            physically_active: true,
            risk_enhancers: Vec::new(),
        }
    }

    /// Smoker, 150/95, BMI 28, cholesterol high, glucose above normal, inactive, drinks.
    pub fn high_risk() -> PatientProfile {
        PatientProfile {
            age_years: 58,
            sex: BiologicalSex::Male,
            height_cm: 175.0,
            // 28.0 * 1.75^2
            weight_kg: 85.75,
            systolic: 150,
            diastolic: 95,
            cholesterol: ClinicalLevel::High,
            glucose: ClinicalLevel::AboveNormal,
            smoker: true,
            drinks_alcohol: true,
            physically_active: false,
            risk_enhancers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_sex_codes() {
        assert!((BiologicalSex::Female.code() - 1.0).abs() < f64::EPSILON);
        assert!((BiologicalSex::Male.code() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_level_ordinals() {
        for level in [ClinicalLevel::Normal, ClinicalLevel::AboveNormal, ClinicalLevel::High] {
            assert_eq!(ClinicalLevel::from_ordinal(level.ordinal()), Ok(level));
        }
        assert!(ClinicalLevel::from_ordinal(0).is_err());
        assert!(ClinicalLevel::from_ordinal(4).is_err());
        assert_eq!(ClinicalLevel::High.to_string(), "High");
    }

    #[test]
    fn test_validation() {
        assert!(healthy().validate().is_ok());
        assert!(high_risk().validate().is_ok());

        let invalid = PatientProfile {
            age_years: 0,
            height_cm: 40.0,
            weight_kg: f64::NAN,
            systolic: 300,
            ..healthy()
        };
        let errors = invalid.validate().expect_err("should reject");
        assert_eq!(errors.len(), 4);
        assert!(errors[0].starts_with("Age 0 out of range"));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let edge = PatientProfile {
            age_years: 120,
            height_cm: 100.0,
            weight_kg: 250.0,
            systolic: 80,
            diastolic: 120,
            ..healthy()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_enhancers_are_normalized() {
        let profile = healthy().with_enhancers([
            RiskEnhancer::MetabolicSyndrome,
            RiskEnhancer::FamilyHistory,
            RiskEnhancer::MetabolicSyndrome,
        ]);
        assert_eq!(
            profile.risk_enhancers,
            vec![RiskEnhancer::FamilyHistory, RiskEnhancer::MetabolicSyndrome]
        );
    }
}
