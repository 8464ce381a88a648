//! Staffing marketplace workflow: company job requests, admin-approved postings, seeker
//! applications managed as a bounded bucket, and post-event reputation.

pub mod applications;
pub mod desk;
pub mod domain;
pub mod error;
pub mod export;
mod extract;
pub mod memory;
pub mod postings;
pub mod repository;
pub mod reputation;
pub mod router;

#[cfg(test)]
mod tests;

pub use applications::{ApplicationBucketService, BucketPolicy, BucketSnapshot, BUCKET_MULTIPLIER};
pub use desk::{ApplicantReview, Candidate, StaffingDesk};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, CompanyId,
    CustomFieldKind, CustomFieldSpec, CustomFieldValue, EventDetails, FluencyLevel, Job, JobId,
    JobRequest, JobRequestSubmission, RequestDecision, RequestId, RequestStatus, Review,
    ReviewOutcome, SeekerId, SeekerProfile, SeekerRegistration,
};
pub use error::StaffingError;
pub use export::ExportError;
pub use memory::MemoryStore;
pub use postings::{DashboardSummary, JobApproval, JobPostingService, JobSummary, JobView};
pub use repository::{
    ApplicationFilter, EntityStore, JobFlags, JobTransition, Notice, Notifier, NotifyError,
    RepositoryError, StatusTransition,
};
pub use reputation::{
    AverageRating, BanPolicy, RatingSubmission, RedFlagSubmission, ReputationCache,
    ReputationEngine, ReputationService, SeekerReputation, SeekerStats,
};
pub use router::staffing_router;
