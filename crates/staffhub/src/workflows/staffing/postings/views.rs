use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::applications::BucketSnapshot;
use super::super::domain::Job;

/// Which slice of the job board a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobView {
    /// Seeker-facing: not archived, not completed, event not over.
    Active,
    /// Hidden from seekers but still in flight.
    Archived,
    /// Completed events.
    History,
    #[default]
    All,
}

impl JobView {
    pub fn includes(self, job: &Job, today: NaiveDate) -> bool {
        match self {
            JobView::Active => job.is_active(today),
            JobView::Archived => job.archived && !job.completed,
            JobView::History => job.completed,
            JobView::All => true,
        }
    }
}

/// A job together with its applicant bucket progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    pub active: bool,
    pub bucket: BucketSnapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub pending_requests: u32,
    pub active_jobs: u32,
    pub archived_jobs: u32,
    pub completed_jobs: u32,
    pub pending_applications: u32,
    pub accepted_applications: u32,
}
