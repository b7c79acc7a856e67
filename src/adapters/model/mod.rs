//! JSON model adapter: Implementation of `RiskClassifier`.
//!
//! Loads a classifier exported by the training pipeline as JSON. Two
//! estimator kinds are supported:
//! - `logistic`: optional standardization, linear term, sigmoid
//! - `tree_ensemble`: mean leaf probability over decision trees
//!
//! # Feature contract
//!
//! The artifact declares the column names it was trained on. They must equal
//! the configured [`FeatureLayout`] exactly, so a BMI-augmented artifact can
//! never be fed an 11-column vector (or the reverse).
//!
//! # Integrity
//!
//! The SHA-256 of the artifact bytes is always computed and logged. When a pin
//! is configured the artifact is refused unless the digest matches.

mod tree;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureLayout, FeatureVector, RiskLabel};
use crate::ports::{ModelError, RiskClassifier};

pub use tree::{DecisionTree, TreeEnsemble, TreeNode};

/// Only artifact format understood by this adapter.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Default upper bound on artifact loading.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

fn default_threshold() -> f64 {
    0.5
}

/// On-disk model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub name: String,
    pub feature_names: Vec<String>,
    /// Probability at or above which the label is 1
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub estimator: Estimator,
}

/// Supported estimator kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

/// Logistic regression with optional standardization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_scale: Option<Vec<f64>>,
}

impl LogisticModel {
    fn validate(&self, width: usize) -> Result<(), String> {
        if self.coefficients.len() != width {
            return Err(format!(
                "logistic model has {} coefficients, layout has {width} features",
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("logistic model has non-finite parameters".to_string());
        }
        for (name, values) in [("scaler_mean", &self.scaler_mean), ("scaler_scale", &self.scaler_scale)] {
            if let Some(values) = values {
                if values.len() != width {
                    return Err(format!("{name} has {} entries, expected {width}", values.len()));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(format!("{name} has non-finite entries"));
                }
            }
        }
        if let Some(scale) = &self.scaler_scale {
            if scale.iter().any(|s| *s == 0.0) {
                return Err("scaler_scale contains zero".to_string());
            }
        }
        Ok(())
    }

    fn probability(&self, x: &[f64]) -> f64 {
        let z = x
            .iter()
            .enumerate()
            .fold(self.intercept, |acc, (i, value)| {
                let mean = self.scaler_mean.as_ref().map_or(0.0, |m| m[i]);
                let scale = self.scaler_scale.as_ref().map_or(1.0, |s| s[i]);
                acc + self.coefficients[i] * (value - mean) / scale
            });
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Where and how to load a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub path: PathBuf,
    pub layout: FeatureLayout,
    /// Expected SHA-256 (hex) of the artifact, if pinned
    pub sha256: Option<String>,
    pub load_timeout: Duration,
}

impl ModelSpec {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, layout: FeatureLayout) -> Self {
        Self {
            path: path.into(),
            layout,
            sha256: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }
}

/// Classifier backed by a JSON artifact.
///
/// Immutable after loading; safe to share across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct JsonModelClassifier {
    name: String,
    layout: FeatureLayout,
    threshold: f64,
    estimator: Estimator,
    digest: String,
}

impl JsonModelClassifier {
    /// Load and verify a model artifact, blocking the current thread.
    ///
    /// # Errors
    /// Returns `ModelError` if the file is missing, unreadable, fails its
    /// digest pin, cannot be parsed, or violates the feature contract.
    pub fn load(spec: &ModelSpec) -> Result<Self, ModelError> {
        let bytes = read_artifact(&spec.path)?;
        let digest = sha256_hex(&bytes);

        if let Some(expected) = &spec.sha256 {
            if !expected.trim().eq_ignore_ascii_case(&digest) {
                return Err(ModelError::DigestMismatch {
                    expected: expected.trim().to_ascii_lowercase(),
                    actual: digest,
                });
            }
        }

        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        let model = Self::from_artifact(artifact, spec.layout, digest)?;

        tracing::info!(
            "Loaded model '{}' ({} layout, sha256 {})",
            model.name,
            model.layout,
            model.digest
        );
        Ok(model)
    }

    /// Load on a helper thread, giving up after `spec.load_timeout`.
    ///
    /// A timed-out loader thread is left to finish on its own; its result is
    /// discarded.
    ///
    /// # Errors
    /// Returns `ModelError::LoadTimeout` when the deadline passes, otherwise
    /// the same errors as [`JsonModelClassifier::load`].
    pub fn load_with_timeout(spec: &ModelSpec) -> Result<Self, ModelError> {
        let (tx, rx) = mpsc::channel();
        let thread_spec = spec.clone();

        std::thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let _ = tx.send(Self::load(&thread_spec));
            })
            .map_err(|source| ModelError::Unreadable {
                path: spec.path.clone(),
                source,
            })?;

        match rx.recv_timeout(spec.load_timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("Model loading timed out after {:?}", spec.load_timeout);
                Err(ModelError::LoadTimeout(spec.load_timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ModelError::Malformed(
                "model loader exited without a result".to_string(),
            )),
        }
    }

    /// Build a classifier from an already-parsed artifact.
    ///
    /// # Errors
    /// Returns `ModelError::FeatureContract` or `ModelError::Malformed` if the
    /// artifact does not fit `layout`.
    pub fn from_artifact(
        artifact: ModelArtifact,
        layout: FeatureLayout,
        digest: String,
    ) -> Result<Self, ModelError> {
        if artifact.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelError::Malformed(format!(
                "unsupported format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                artifact.format_version
            )));
        }

        let expected = layout.feature_names();
        if artifact.feature_names.len() != expected.len()
            || artifact
                .feature_names
                .iter()
                .zip(expected.iter())
                .any(|(got, want)| got != want)
        {
            return Err(ModelError::FeatureContract(format!(
                "artifact columns [{}] do not match {layout} layout [{}]",
                artifact.feature_names.join(", "),
                expected.join(", ")
            )));
        }

        if !(artifact.threshold > 0.0 && artifact.threshold < 1.0) {
            return Err(ModelError::Malformed(format!(
                "threshold {} outside (0, 1)",
                artifact.threshold
            )));
        }

        let width = layout.len();
        match &artifact.estimator {
            Estimator::Logistic(model) => model.validate(width),
            Estimator::TreeEnsemble(ensemble) => ensemble.validate(width),
        }
        .map_err(ModelError::Malformed)?;

        Ok(Self {
            name: artifact.name,
            layout,
            threshold: artifact.threshold,
            estimator: artifact.estimator,
            digest,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SHA-256 of the artifact this classifier was loaded from.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn checked_values<'a>(&self, vector: &'a FeatureVector) -> Result<&'a [f64], ModelError> {
        if vector.layout() != self.layout || vector.len() != self.layout.len() {
            return Err(ModelError::FeatureCount {
                expected: self.layout.len(),
                actual: vector.len(),
            });
        }
        Ok(vector.values())
    }

    fn probability(&self, x: &[f64]) -> f64 {
        match &self.estimator {
            Estimator::Logistic(model) => model.probability(x),
            Estimator::TreeEnsemble(ensemble) => ensemble.probability(x),
        }
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ModelError> {
    fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ModelError::NotFound(path.to_path_buf())
        } else {
            ModelError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

impl RiskClassifier for JsonModelClassifier {
    fn layout(&self) -> FeatureLayout {
        self.layout
    }

    fn predict(&self, vector: &FeatureVector) -> Result<RiskLabel, ModelError> {
        let x = self.checked_values(vector)?;
        Ok(if self.probability(x) >= self.threshold {
            RiskLabel::High
        } else {
            RiskLabel::Low
        })
    }

    fn predict_probability(&self, vector: &FeatureVector) -> Result<Option<f64>, ModelError> {
        let x = self.checked_values(vector)?;
        Ok(Some(self.probability(x)))
    }
}

/// Compute the SHA-256 pin for an artifact file.
///
/// # Errors
/// Returns `ModelError::NotFound` or `ModelError::Unreadable`.
pub fn artifact_digest(path: &Path) -> Result<String, ModelError> {
    read_artifact(path).map(|bytes| sha256_hex(&bytes))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use crate::domain::FeatureLayout;

    /// Logistic artifact that only looks at systolic pressure:
    /// probability crosses 0.5 at 140 mmHg.
    pub fn systolic_logistic_json(layout: FeatureLayout) -> String {
        let names: Vec<String> = layout
            .feature_names()
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect();
        let mut coefficients = vec!["0.0"; layout.len()];
        coefficients[4] = "0.1";
        format!(
            r#"{{
  "format_version": 1,
  "name": "systolic-only",
  "feature_names": [{}],
  "threshold": 0.5,
  "estimator": {{
    "kind": "logistic",
    "coefficients": [{}],
    "intercept": -14.0
  }}
}}"#,
            names.join(", "),
            coefficients.join(", ")
        )
    }

    pub fn write_artifact(dir: &Path, file: &str, json: &str) -> std::path::PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, json).expect("write artifact");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::domain::{encode, fixtures};
    use tempfile::tempdir;

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let spec = ModelSpec::new(dir.path().join("absent.json"), FeatureLayout::Standard);
        assert!(matches!(
            JsonModelClassifier::load(&spec),
            Err(ModelError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = tempdir().expect("tempdir");
        let path = write_artifact(dir.path(), "model.json", "{ not json");
        let spec = ModelSpec::new(path, FeatureLayout::Standard);
        assert!(matches!(
            JsonModelClassifier::load(&spec),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_logistic_prediction() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::Standard);
        let path = write_artifact(dir.path(), "model.json", &json);
        let model = JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::Standard))
            .expect("load");

        let high = encode(&fixtures::high_risk(), FeatureLayout::Standard);
        let low = encode(&fixtures::healthy(), FeatureLayout::Standard);

        assert_eq!(model.predict(&high).expect("predict"), RiskLabel::High);
        assert_eq!(model.predict(&low).expect("predict"), RiskLabel::Low);

        let p = model.predict_probability(&high).expect("proba").expect("some");
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
        assert_eq!(model.predict_probability(&high).expect("proba"), Some(p));
        assert_eq!(model.digest().len(), 64);
    }

    #[test]
    fn test_feature_contract_mismatch() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::WithBmi);
        let path = write_artifact(dir.path(), "model.json", &json);

        let err = JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::Standard))
            .expect_err("12-column artifact must not load as standard");
        assert!(matches!(err, ModelError::FeatureContract(_)));
    }

    #[test]
    fn test_vector_layout_mismatch() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::WithBmi);
        let path = write_artifact(dir.path(), "model.json", &json);
        let model = JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::WithBmi))
            .expect("load");

        let vector = encode(&fixtures::healthy(), FeatureLayout::Standard);
        assert!(matches!(
            model.predict(&vector),
            Err(ModelError::FeatureCount {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_digest_pin() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::Standard);
        let path = write_artifact(dir.path(), "model.json", &json);
        let digest = artifact_digest(&path).expect("digest");

        let pinned = ModelSpec::new(&path, FeatureLayout::Standard).with_sha256(digest.to_uppercase());
        assert!(JsonModelClassifier::load(&pinned).is_ok());

        let wrong = ModelSpec::new(&path, FeatureLayout::Standard).with_sha256("00".repeat(32));
        assert!(matches!(
            JsonModelClassifier::load(&wrong),
            Err(ModelError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_threshold_and_version_checks() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::Standard);

        let bad_threshold = json.replace("\"threshold\": 0.5", "\"threshold\": 1.5");
        let path = write_artifact(dir.path(), "threshold.json", &bad_threshold);
        assert!(matches!(
            JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::Standard)),
            Err(ModelError::Malformed(_))
        ));

        let bad_version = json.replace("\"format_version\": 1", "\"format_version\": 2");
        let path = write_artifact(dir.path(), "version.json", &bad_version);
        assert!(matches!(
            JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::Standard)),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_tree_ensemble_artifact() {
        let dir = tempdir().expect("tempdir");
        let names: Vec<String> = FeatureLayout::Standard
            .feature_names()
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect();
        let json = format!(
            r#"{{
  "format_version": 1,
  "feature_names": [{}],
  "estimator": {{
    "kind": "tree_ensemble",
    "trees": [
      {{ "nodes": [
        {{ "split": {{ "feature": 4, "threshold": 139.5, "left": 1, "right": 2 }} }},
        {{ "leaf": {{ "probability": 0.2 }} }},
        {{ "leaf": {{ "probability": 0.9 }} }}
      ] }},
      {{ "nodes": [
        {{ "split": {{ "feature": 6, "threshold": 1.5, "left": 1, "right": 2 }} }},
        {{ "leaf": {{ "probability": 0.1 }} }},
        {{ "leaf": {{ "probability": 0.7 }} }}
      ] }}
    ]
  }}
}}"#,
            names.join(", ")
        );
        let path = write_artifact(dir.path(), "forest.json", &json);
        let model = JsonModelClassifier::load(&ModelSpec::new(path, FeatureLayout::Standard))
            .expect("load forest");
        assert!((model.threshold() - 0.5).abs() < f64::EPSILON);

        let high = encode(&fixtures::high_risk(), FeatureLayout::Standard);
        let p = model.predict_probability(&high).expect("proba").expect("some");
        assert!((p - 0.8).abs() < 1e-12);
        assert_eq!(model.predict(&high).expect("predict"), RiskLabel::High);

        let low = encode(&fixtures::healthy(), FeatureLayout::Standard);
        assert_eq!(model.predict(&low).expect("predict"), RiskLabel::Low);
    }

    #[test]
    fn test_load_with_timeout_returns_model() {
        let dir = tempdir().expect("tempdir");
        let json = systolic_logistic_json(FeatureLayout::Standard);
        let path = write_artifact(dir.path(), "model.json", &json);
        let spec = ModelSpec::new(path, FeatureLayout::Standard)
            .with_load_timeout(Duration::from_secs(10));
        assert!(JsonModelClassifier::load_with_timeout(&spec).is_ok());
    }

    #[test]
    fn test_load_with_zero_timeout_fails_fast() {
        let dir = tempdir().expect("tempdir");
        let spec = ModelSpec::new(dir.path().join("model.json"), FeatureLayout::Standard)
            .with_load_timeout(Duration::ZERO);
        // Either the loader lost the race (timeout) or it reported the missing file first.
        match JsonModelClassifier::load_with_timeout(&spec) {
            Err(ModelError::LoadTimeout(_)) | Err(ModelError::NotFound(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
