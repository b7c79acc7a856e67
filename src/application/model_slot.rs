//! Load-once holder for the shared classifier.

use std::sync::{Arc, Mutex, OnceLock};

use crate::adapters::{JsonModelClassifier, ModelSpec};
use crate::ports::ModelError;

/// Process-wide classifier, loaded on first use.
///
/// Concurrent callers block on a single init lock, so the artifact is read at
/// most once per successful load. Failures are returned but not remembered:
/// the next call tries again.
#[derive(Debug)]
pub struct ModelSlot {
    spec: ModelSpec,
    model: OnceLock<Arc<JsonModelClassifier>>,
    init: Mutex<()>,
}

impl ModelSlot {
    #[must_use]
    pub fn new(spec: ModelSpec) -> Self {
        Self {
            spec,
            model: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Return the loaded model, loading it now if needed.
    ///
    /// # Errors
    /// Returns the `ModelError` from loading; nothing is cached on failure.
    pub fn get_or_load(&self) -> Result<Arc<JsonModelClassifier>, ModelError> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        // A poisoned lock only means another loader panicked; the slot itself
        // is still empty or fully set.
        let _guard = self
            .init
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        tracing::debug!("Loading model from {}", self.spec.path.display());
        let model = Arc::new(JsonModelClassifier::load_with_timeout(&self.spec)?);
        Ok(Arc::clone(self.model.get_or_init(|| model)))
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}
