//! # CardioCare
//!
//! Cardiovascular risk scoring and reporting pipeline.
//!
//! This crate provides:
//! - Feature encoding for a pre-trained CardioTrain classifier
//! - A deterministic heart-health score and rule-based insights
//! - Clinical reports rendered to PDF and exported atomically
//! - Terminal UI for local-only use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (profile, features, score, insights, report)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (JSON model, printpdf, tempfile)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface
//!
//! Nothing here is a diagnostic device. Every report carries a disclaimer.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{PatientProfile, RiskAssessment, RiskLabel};

/// Result type for CardioCare operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for CardioCare
#[derive(Debug, thiserror::Error)]
pub enum CardioError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ports::ModelError),

    #[error("Invalid patient data: {0}")]
    InvalidInput(String),

    #[error("Report generation failed: {0}")]
    ReportGeneration(#[from] domain::ReportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CardioError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
