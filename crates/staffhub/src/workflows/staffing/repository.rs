use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobRequest, RequestId, Review,
    SeekerId, SeekerProfile,
};

/// Storage abstraction for every record the lifecycle engine owns.
///
/// Methods that guard a state transition take the expected source state and must check and
/// write under one critical section, so concurrent callers cannot both win the same transition.
pub trait EntityStore: Send + Sync {
    fn insert_request(&self, request: JobRequest) -> Result<JobRequest, RepositoryError>;
    fn fetch_request(&self, id: &RequestId) -> Result<Option<JobRequest>, RepositoryError>;
    fn list_requests(&self) -> Result<Vec<JobRequest>, RepositoryError>;

    /// Mark a pending request approved and store the derived job in one step.
    fn record_approval(
        &self,
        id: &RequestId,
        job: Job,
        decided_at: DateTime<Utc>,
    ) -> Result<(JobRequest, Job), RepositoryError>;

    /// Mark a pending request rejected.
    fn record_rejection(
        &self,
        id: &RequestId,
        reason: String,
        decided_at: DateTime<Utc>,
    ) -> Result<JobRequest, RepositoryError>;

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    /// Flip a job's flags only if they still match `transition.from`.
    fn transition_job(&self, id: &JobId, transition: JobTransition)
        -> Result<Job, RepositoryError>;

    /// Fails with `Conflict` when the seeker already applied to the job.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn transition_application(
        &self,
        id: &ApplicationId,
        transition: StatusTransition,
    ) -> Result<Application, RepositoryError>;
    fn remove_application(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
    ) -> Result<Application, RepositoryError>;

    /// Fails with `Conflict` when the (seeker, job) pair was already reviewed.
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn reviews_for_seeker(&self, seeker_id: &SeekerId) -> Result<Vec<Review>, RepositoryError>;

    fn insert_seeker(&self, profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError>;
    fn fetch_seeker(&self, id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError>;
}

/// Optional narrowing for application listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub job_id: Option<JobId>,
    pub seeker_id: Option<SeekerId>,
}

impl ApplicationFilter {
    pub fn for_job(job_id: &JobId) -> Self {
        Self {
            job_id: Some(job_id.clone()),
            seeker_id: None,
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.job_id
            .as_ref()
            .map_or(true, |job_id| &application.job_id == job_id)
            && self
                .seeker_id
                .as_ref()
                .map_or(true, |seeker_id| &application.seeker_id == seeker_id)
    }
}

/// Compare-and-set request for an application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    /// When set, the write is refused once the job already holds this many accepted
    /// applications.
    pub accepted_limit: Option<u32>,
}

/// The two lifecycle flags a job carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobFlags {
    pub archived: bool,
    pub completed: bool,
}

impl JobFlags {
    pub fn of(job: &Job) -> Self {
        Self {
            archived: job.archived,
            completed: job.completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match (self.completed, self.archived) {
            (true, _) => "completed",
            (false, true) => "archived",
            (false, false) => "open",
        }
    }
}

/// Compare-and-set request for a job's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTransition {
    pub from: JobFlags,
    pub to: JobFlags,
    /// Refuse the write while the job's bucket is at quota or full.
    pub require_open_bucket: bool,
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record is {found}, expected {expected}")]
    StaleStatus {
        expected: &'static str,
        found: &'static str,
    },
    #[error("accepted quota reached ({accepted}/{limit})")]
    QuotaReached { accepted: u32, limit: u32 },
    #[error("bucket closed: {0}")]
    BucketClosed(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (e-mail delivery lives behind it).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub template: String,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

impl Notice {
    pub fn new(template: &str, recipient: impl Into<String>) -> Self {
        Self {
            template: template.to_string(),
            recipient: recipient.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
