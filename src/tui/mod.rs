//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides:
//! - Patient data form with range-checked fields
//! - Assessment progress and result view
//! - PDF export of the current assessment

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::ClinicalTheme;
pub use worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};
