use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::applications::bucket::snapshot_for;
use super::super::applications::custom_fields::validate_schema;
use super::super::domain::{
    ApplicationStatus, CustomFieldSpec, Job, JobId, JobRequest, JobRequestSubmission,
    RequestDecision, RequestId, RequestStatus,
};
use super::super::error::StaffingError;
use super::super::repository::{
    ApplicationFilter, EntityStore, JobFlags, JobTransition, Notice, Notifier, RepositoryError,
};
use super::views::{DashboardSummary, JobSummary, JobView};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Admin overrides applied when a request is turned into a job. Unset fields keep the
/// company's wording; `payment` is where the admin posts the seeker-facing rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobApproval {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub payment: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Vec<CustomFieldSpec>>,
}

/// Only writer of request decisions and of the `archived`/`completed` job flags.
pub struct JobPostingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> JobPostingService<S, N>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    pub fn submit_request(
        &self,
        submission: JobRequestSubmission,
    ) -> Result<JobRequest, StaffingError> {
        let required = [
            ("companyId", submission.company_id.0.as_str()),
            ("companyName", submission.company_name.as_str()),
            ("title", submission.title.as_str()),
            ("location", submission.event.location.as_str()),
            ("contactPhone", submission.event.contact_phone.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(StaffingError::Validation(format!("{field} is required")));
        }
        if submission.event.helpers_needed == 0 {
            return Err(StaffingError::Validation(
                "helpersNeeded must be at least 1".to_string(),
            ));
        }
        if submission.event.event_end_date < submission.event.event_start_date {
            return Err(StaffingError::Validation(
                "eventEndDate must not precede eventStartDate".to_string(),
            ));
        }
        validate_schema(&submission.custom_fields)
            .map_err(|err| StaffingError::Validation(err.to_string()))?;

        let request = JobRequest {
            id: next_request_id(),
            company_id: submission.company_id,
            company_name: submission.company_name,
            title: submission.title.trim().to_string(),
            event: submission.event,
            payment_offered: submission.payment_offered,
            description: submission.description,
            custom_fields: submission.custom_fields,
            submitted_at: Utc::now(),
            decision: RequestDecision::Pending,
        };

        let stored = self.store.insert_request(request)?;
        info!(
            request_id = %stored.id,
            company_id = %stored.company_id,
            helpers_needed = stored.event.helpers_needed,
            "job request submitted"
        );
        Ok(stored)
    }

    /// Turn a pending request into a live job and tell the company.
    pub fn approve(
        &self,
        request_id: &RequestId,
        approval: JobApproval,
    ) -> Result<(JobRequest, Job), StaffingError> {
        let request = self.pending_request(request_id)?;

        let title = override_or(approval.title, &request.title, "title")?;
        let payment = override_or(approval.payment, &request.payment_offered, "payment")?;
        let description = match approval.description {
            Some(description) => description,
            None => request.description.clone(),
        };
        let custom_fields = match approval.custom_fields {
            Some(fields) => {
                validate_schema(&fields)
                    .map_err(|err| StaffingError::Validation(err.to_string()))?;
                fields
            }
            None => request.custom_fields.clone(),
        };

        let now = Utc::now();
        let job = Job {
            id: next_job_id(),
            request_id: request.id.clone(),
            company_id: request.company_id.clone(),
            company_name: request.company_name.clone(),
            title,
            event: request.event.clone(),
            payment,
            description,
            custom_fields,
            archived: false,
            completed: false,
            created_at: now,
        };

        let (request, job) = self
            .store
            .record_approval(request_id, job, now)
            .map_err(|err| decision_error(err, request_id))?;

        info!(request_id = %request.id, job_id = %job.id, "job request approved");
        self.notifier.notify(
            Notice::new("job_request_approved", request.company_id.to_string())
                .with("request_id", request.id.to_string())
                .with("job_id", job.id.to_string())
                .with("job_title", job.title.clone()),
        )?;

        Ok((request, job))
    }

    pub fn reject(&self, request_id: &RequestId, reason: &str) -> Result<JobRequest, StaffingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(StaffingError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }
        self.pending_request(request_id)?;

        let request = self
            .store
            .record_rejection(request_id, reason.to_string(), Utc::now())
            .map_err(|err| decision_error(err, request_id))?;

        info!(request_id = %request.id, "job request rejected");
        self.notifier.notify(
            Notice::new("job_request_rejected", request.company_id.to_string())
                .with("request_id", request.id.to_string())
                .with("title", request.title.clone())
                .with("reason", reason),
        )?;

        Ok(request)
    }

    /// `POST /jobs/:id/archive` entry point.
    pub fn set_archived(&self, job_id: &JobId, archived: bool) -> Result<Job, StaffingError> {
        if archived {
            self.archive(job_id)
        } else {
            self.unarchive(job_id)
        }
    }

    pub fn archive(&self, job_id: &JobId) -> Result<Job, StaffingError> {
        let job = self.job(job_id)?;
        if job.completed {
            return Err(StaffingError::PreconditionFailed(format!(
                "job {job_id} is completed and cannot be archived"
            )));
        }
        if job.archived {
            return Err(StaffingError::PreconditionFailed(format!(
                "job {job_id} is already archived"
            )));
        }

        let from = JobFlags::of(&job);
        let job = self
            .store
            .transition_job(
                job_id,
                JobTransition {
                    from,
                    to: JobFlags {
                        archived: true,
                        ..from
                    },
                    require_open_bucket: false,
                },
            )
            .map_err(|err| job_transition_error(err, job_id, "archived"))?;
        info!(job_id = %job.id, "job archived");
        Ok(job)
    }

    /// Put an archived job back on the board unless its bucket has nothing left to offer.
    pub fn unarchive(&self, job_id: &JobId) -> Result<Job, StaffingError> {
        let job = self.job(job_id)?;
        if job.completed {
            return Err(StaffingError::PreconditionFailed(format!(
                "job {job_id} is completed and cannot be unarchived"
            )));
        }
        if !job.archived {
            return Err(StaffingError::PreconditionFailed(format!(
                "job {job_id} is not archived"
            )));
        }

        let from = JobFlags::of(&job);
        let job = self
            .store
            .transition_job(
                job_id,
                JobTransition {
                    from,
                    to: JobFlags {
                        archived: false,
                        ..from
                    },
                    require_open_bucket: true,
                },
            )
            .map_err(|err| job_transition_error(err, job_id, "unarchived"))?;
        info!(job_id = %job.id, "job unarchived");
        Ok(job)
    }

    /// One-way switch that unlocks post-event reviews.
    pub fn complete(&self, job_id: &JobId) -> Result<Job, StaffingError> {
        let job = self.job(job_id)?;
        if job.completed {
            return Err(StaffingError::PreconditionFailed(format!(
                "job {job_id} is already completed"
            )));
        }

        let from = JobFlags::of(&job);
        let job = self
            .store
            .transition_job(
                job_id,
                JobTransition {
                    from,
                    to: JobFlags {
                        completed: true,
                        ..from
                    },
                    require_open_bucket: false,
                },
            )
            .map_err(|err| job_transition_error(err, job_id, "completed"))?;
        info!(job_id = %job.id, "job completed");
        Ok(job)
    }

    pub fn job_summary(&self, job_id: &JobId, today: NaiveDate) -> Result<JobSummary, StaffingError> {
        let job = self.job(job_id)?;
        self.summarize(job, today)
    }

    pub fn list_jobs(&self, view: JobView, today: NaiveDate) -> Result<Vec<JobSummary>, StaffingError> {
        self.store
            .list_jobs()?
            .into_iter()
            .filter(|job| view.includes(job, today))
            .map(|job| self.summarize(job, today))
            .collect()
    }

    pub fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<JobRequest>, StaffingError> {
        Ok(self
            .store
            .list_requests()?
            .into_iter()
            .filter(|request| status.map_or(true, |status| request.status() == status))
            .collect())
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, StaffingError> {
        let mut summary = DashboardSummary::default();

        summary.pending_requests = self
            .store
            .list_requests()?
            .iter()
            .filter(|request| request.status() == RequestStatus::Pending)
            .count() as u32;

        for job in self.store.list_jobs()? {
            if job.completed {
                summary.completed_jobs += 1;
            } else if job.archived {
                summary.archived_jobs += 1;
            } else if job.is_active(today) {
                summary.active_jobs += 1;
            }
        }

        for application in self.store.list_applications(&ApplicationFilter::default())? {
            match application.status {
                ApplicationStatus::Pending => summary.pending_applications += 1,
                ApplicationStatus::Accepted => summary.accepted_applications += 1,
                ApplicationStatus::Rejected => {}
            }
        }

        Ok(summary)
    }

    fn summarize(&self, job: Job, today: NaiveDate) -> Result<JobSummary, StaffingError> {
        let bucket = snapshot_for(self.store.as_ref(), &job)?;
        Ok(JobSummary {
            active: job.is_active(today),
            job,
            bucket,
        })
    }

    fn pending_request(&self, request_id: &RequestId) -> Result<JobRequest, StaffingError> {
        let request = self
            .store
            .fetch_request(request_id)?
            .ok_or_else(|| StaffingError::not_found("job request", request_id))?;
        if request.status() != RequestStatus::Pending {
            return Err(StaffingError::PreconditionFailed(format!(
                "job request {request_id} is already {}",
                request.status().label()
            )));
        }
        Ok(request)
    }

    fn job(&self, job_id: &JobId) -> Result<Job, StaffingError> {
        self.store
            .fetch_job(job_id)?
            .ok_or_else(|| StaffingError::not_found("job", job_id))
    }
}

fn override_or(value: Option<String>, fallback: &str, field: &str) -> Result<String, StaffingError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(StaffingError::Validation(format!(
            "{field} override must not be blank"
        ))),
        Some(value) => Ok(value.trim().to_string()),
        None => Ok(fallback.to_string()),
    }
}

fn job_transition_error(err: RepositoryError, job_id: &JobId, action: &str) -> StaffingError {
    match err {
        RepositoryError::NotFound => StaffingError::not_found("job", job_id),
        RepositoryError::StaleStatus { found, .. } => StaffingError::PreconditionFailed(format!(
            "job {job_id} is now {found} and cannot be {action}"
        )),
        RepositoryError::BucketClosed(blocker) => StaffingError::PreconditionFailed(format!(
            "job {job_id} cannot be {action}: {blocker}"
        )),
        other => other.into(),
    }
}

fn decision_error(err: RepositoryError, request_id: &RequestId) -> StaffingError {
    match err {
        RepositoryError::NotFound => StaffingError::not_found("job request", request_id),
        RepositoryError::StaleStatus { found, .. } => StaffingError::PreconditionFailed(format!(
            "job request {request_id} is already {found}"
        )),
        other => other.into(),
    }
}
