//! Classifier port: Trait for the pre-trained risk model.
//!
//! This trait isolates the pipeline from the concrete model implementation.
//! Implementations must be deterministic: the same artifact and vector give
//! the same answer, with no randomness at inference time.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{FeatureLayout, FeatureVector, RiskLabel};

/// Error type for model loading and inference.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("model artifact at {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is malformed: {0}")]
    Malformed(String),

    #[error("model digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("model feature contract mismatch: {0}")]
    FeatureContract(String),

    #[error("model loading exceeded {0:?}")]
    LoadTimeout(Duration),

    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
}

/// Trait for binary cardiovascular-risk classifiers.
pub trait RiskClassifier: Send + Sync {
    /// Column layout the underlying model was trained on.
    fn layout(&self) -> FeatureLayout;

    /// Predict the risk label (0 = low, 1 = high).
    ///
    /// # Errors
    /// Returns `ModelError::FeatureCount` if the vector does not match
    /// [`RiskClassifier::layout`].
    fn predict(&self, vector: &FeatureVector) -> Result<RiskLabel, ModelError>;

    /// Probability of the high-risk class, if the model exposes one.
    ///
    /// # Errors
    /// Returns `ModelError::FeatureCount` if the vector does not match
    /// [`RiskClassifier::layout`].
    fn predict_probability(&self, vector: &FeatureVector) -> Result<Option<f64>, ModelError> {
        let _ = vector;
        Ok(None)
    }
}

impl<C: RiskClassifier + ?Sized> RiskClassifier for std::sync::Arc<C> {
    fn layout(&self) -> FeatureLayout {
        (**self).layout()
    }

    fn predict(&self, vector: &FeatureVector) -> Result<RiskLabel, ModelError> {
        (**self).predict(vector)
    }

    fn predict_probability(&self, vector: &FeatureVector) -> Result<Option<f64>, ModelError> {
        (**self).predict_probability(vector)
    }
}
