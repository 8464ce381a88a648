//! Job Posting Lifecycle: request review, archive toggling, and completion.

pub mod service;
pub mod views;

pub use service::{JobApproval, JobPostingService};
pub use views::{DashboardSummary, JobSummary, JobView};
