//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod assessment;
mod model_slot;
pub mod report;
mod session;

pub use assessment::AssessmentService;
pub use model_slot::ModelSlot;
pub use report::{compose, report_file_name, ReportService, REPORT_CONTENT_TYPE};
pub use session::{AssessmentSession, SessionEntry};
