use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a company's staffing request.
    RequestId
);
string_id!(
    /// Identifier of a posted job.
    JobId
);
string_id!(
    /// Identifier of a seeker's application.
    ApplicationId
);
string_id!(
    /// Identifier of a registered job seeker.
    SeekerId
);
string_id!(CompanyId);

/// Event metadata supplied by the company and copied onto the job on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub event_type: String,
    pub location: String,
    pub helpers_needed: u32,
    pub event_start_date: NaiveDate,
    pub event_end_date: NaiveDate,
    #[serde(default)]
    pub event_start_time: Option<NaiveTime>,
    #[serde(default)]
    pub event_end_time: Option<NaiveTime>,
    pub contact_phone: String,
}

/// Kinds of per-job custom questions a company may ask applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldKind {
    PhotoUrl,
    Fluency,
    Text,
}

impl CustomFieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            CustomFieldKind::PhotoUrl => "photo_url",
            CustomFieldKind::Fluency => "fluency",
            CustomFieldKind::Text => "text",
        }
    }
}

/// Declared custom question on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldSpec {
    pub key: String,
    pub label: String,
    pub kind: CustomFieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluencyLevel {
    Basic,
    Conversational,
    Fluent,
    Native,
}

/// Applicant answer to a custom question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CustomFieldValue {
    PhotoUrl(String),
    Fluency(FluencyLevel),
    Text(String),
}

impl CustomFieldValue {
    pub const fn kind(&self) -> CustomFieldKind {
        match self {
            CustomFieldValue::PhotoUrl(_) => CustomFieldKind::PhotoUrl,
            CustomFieldValue::Fluency(_) => CustomFieldKind::Fluency,
            CustomFieldValue::Text(_) => CustomFieldKind::Text,
        }
    }
}

pub type CustomData = BTreeMap<String, CustomFieldValue>;

/// Company payload for `POST /job-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequestSubmission {
    pub company_id: CompanyId,
    pub company_name: String,
    pub title: String,
    #[serde(flatten)]
    pub event: EventDetails,
    pub payment_offered: String,
    pub description: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldSpec>,
}

/// Admin decision recorded on a request. Approval and rejection carry their own data so a
/// request can never hold both a job id and a rejection reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestDecision {
    Pending,
    Approved {
        #[serde(rename = "approvedJobId")]
        approved_job_id: JobId,
        #[serde(rename = "decidedAt")]
        decided_at: DateTime<Utc>,
    },
    Rejected {
        #[serde(rename = "rejectionReason")]
        rejection_reason: String,
        #[serde(rename = "decidedAt")]
        decided_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// A company's staffing ask awaiting (or past) admin review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub id: RequestId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub title: String,
    #[serde(flatten)]
    pub event: EventDetails,
    pub payment_offered: String,
    pub description: String,
    pub custom_fields: Vec<CustomFieldSpec>,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub decision: RequestDecision,
}

impl JobRequest {
    pub fn status(&self) -> RequestStatus {
        match self.decision {
            RequestDecision::Pending => RequestStatus::Pending,
            RequestDecision::Approved { .. } => RequestStatus::Approved,
            RequestDecision::Rejected { .. } => RequestStatus::Rejected,
        }
    }

    pub fn approved_job_id(&self) -> Option<&JobId> {
        match &self.decision {
            RequestDecision::Approved {
                approved_job_id, ..
            } => Some(approved_job_id),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.decision {
            RequestDecision::Rejected {
                rejection_reason, ..
            } => Some(rejection_reason),
            _ => None,
        }
    }
}

/// Live or historical posting derived from an approved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub request_id: RequestId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub title: String,
    #[serde(flatten)]
    pub event: EventDetails,
    pub payment: String,
    pub description: String,
    pub custom_fields: Vec<CustomFieldSpec>,
    pub archived: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Seeker-visible: not archived, not completed, and the event has not ended.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        !self.archived && !self.completed && self.event.event_end_date >= today
    }

    pub fn helpers_needed(&self) -> u32 {
        self.event.helpers_needed
    }

    pub fn accepts_applications(&self) -> bool {
        !self.archived && !self.completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Seeker payload for `POST /applications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub job_id: JobId,
    pub seeker_id: SeekerId,
    pub name: String,
    pub phone: String,
    pub age: u8,
    pub city: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub custom_data: CustomData,
}

/// A seeker's bid for a specific job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub seeker_id: SeekerId,
    pub name: String,
    pub phone: String,
    pub age: u8,
    pub city: String,
    pub experience: String,
    pub availability: String,
    pub custom_data: CustomData,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerRegistration {
    pub seeker_id: SeekerId,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerProfile {
    pub seeker_id: SeekerId,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub age: u8,
    pub registered_at: DateTime<Utc>,
}

/// Post-event verdict on one seeker for one job. Exactly one per (seeker, job).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Rated { stars: u8 },
    Flagged { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub seeker_id: SeekerId,
    pub job_id: JobId,
    pub job_title: String,
    pub reviewed_on: NaiveDate,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

impl Review {
    pub fn stars(&self) -> Option<u8> {
        match self.outcome {
            ReviewOutcome::Rated { stars } => Some(stars),
            ReviewOutcome::Flagged { .. } => None,
        }
    }

    pub fn is_red_flag(&self) -> bool {
        matches!(self.outcome, ReviewOutcome::Flagged { .. })
    }
}
