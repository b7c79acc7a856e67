//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `model`: JSON classifier artifacts (serde, sha2)
//! - `pdf`: report rendering (printpdf)
//! - `export`: atomic report files (tempfile)
//! - `sanitize`: PII filtering for logs (regex)

pub mod export;
pub mod model;
pub mod pdf;
pub mod sanitize;

pub use export::DirectoryExporter;
pub use model::{JsonModelClassifier, ModelSpec};
