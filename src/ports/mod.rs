//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the interfaces the application uses for:
//! - Risk classification (model inference)
//! - Report export

mod classifier;
mod export;

pub use classifier::{ModelError, RiskClassifier};
pub use export::ReportSink;
