//! Assessment result types.
//!
//! Represents the output of one scoring pass: classifier label, heart score
//! and the derived insights.

use serde::{Deserialize, Serialize};

use super::insights::Insight;
use super::patient::RiskEnhancer;

/// Binary classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Label 0
    Low,
    /// Label 1
    High,
}

impl RiskLabel {
    /// Interpret a raw `{0, 1}` model label.
    ///
    /// # Errors
    /// Returns the raw value when it is not 0 or 1.
    pub fn from_label(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            other => Err(other),
        }
    }

    #[must_use]
    pub fn as_label(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Report headline for this label.
    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::Low => "LOW CARDIOVASCULAR RISK",
            Self::High => "HIGH CARDIOVASCULAR RISK",
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Low => "The model suggests a low likelihood of cardiovascular disease at this time.",
            Self::High => "The model indicates an elevated risk of cardiovascular disease.",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Complete outcome of one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Classifier label
    pub label: RiskLabel,

    /// Probability of the high-risk class, when the model exposes one
    pub probability: Option<f64>,

    /// Heart-health score (0-7)
    pub heart_score: u8,

    pub bmi: f64,

    /// Ordered insights
    pub insights: Vec<Insight>,

    /// Active risk enhancers, canonical order
    pub risk_enhancers: Vec<RiskEnhancer>,

    /// When the assessment was produced
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl RiskAssessment {
    /// Insight messages in order.
    #[must_use]
    pub fn insight_messages(&self) -> Vec<&str> {
        self.insights.iter().map(|i| i.message.as_str()).collect()
    }

    /// Display names of the active risk enhancers.
    #[must_use]
    pub fn enhancer_names(&self) -> Vec<&'static str> {
        self.risk_enhancers.iter().map(|e| e.label()).collect()
    }
}
