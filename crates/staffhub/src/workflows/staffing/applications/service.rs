use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::bucket::{snapshot_for, BucketPolicy, BucketSnapshot};
use super::custom_fields::validate_answers;
use super::super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, Job, JobId,
};
use super::super::error::StaffingError;
use super::super::repository::{
    ApplicationFilter, EntityStore, Notice, Notifier, RepositoryError, StatusTransition,
};
use super::super::reputation::ReputationEngine;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Owns every write to `Application::status` and the application rows themselves.
pub struct ApplicationBucketService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    policy: BucketPolicy,
    reputation: ReputationEngine,
}

impl<S, N> ApplicationBucketService<S, N>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        policy: BucketPolicy,
        reputation: ReputationEngine,
    ) -> Self {
        Self {
            store,
            notifier,
            policy,
            reputation,
        }
    }

    pub fn policy(&self) -> BucketPolicy {
        self.policy
    }

    /// Record a seeker's bid for an open job.
    pub fn apply(&self, submission: ApplicationSubmission) -> Result<Application, StaffingError> {
        if submission.name.trim().is_empty() || submission.phone.trim().is_empty() {
            return Err(StaffingError::Validation(
                "applicant name and phone are required".to_string(),
            ));
        }

        let job = self.job(&submission.job_id)?;
        if job.completed {
            return Err(StaffingError::InvalidTransition(format!(
                "job {} is completed and no longer takes applications",
                job.id
            )));
        }
        if job.archived {
            return Err(StaffingError::InvalidTransition(format!(
                "job {} is archived and not taking applications",
                job.id
            )));
        }

        if self.store.fetch_seeker(&submission.seeker_id)?.is_none() {
            return Err(StaffingError::not_found("seeker", &submission.seeker_id));
        }

        validate_answers(&job.custom_fields, &submission.custom_data)
            .map_err(|err| StaffingError::Validation(err.to_string()))?;

        let seeker_id = submission.seeker_id.clone();
        let application = Application {
            id: next_application_id(),
            job_id: submission.job_id,
            seeker_id: submission.seeker_id,
            name: submission.name.trim().to_string(),
            phone: submission.phone.trim().to_string(),
            age: submission.age,
            city: submission.city,
            experience: submission.experience,
            availability: submission.availability,
            custom_data: submission.custom_data,
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
        };

        let stored = match self.store.insert_application(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                return Err(StaffingError::DuplicateApplication {
                    job_id: job.id,
                    seeker_id,
                })
            }
            Err(other) => return Err(other.into()),
        };

        let bucket = snapshot_for(self.store.as_ref(), &job)?;
        info!(
            application_id = %stored.id,
            job_id = %job.id,
            seeker_id = %stored.seeker_id,
            total = bucket.total,
            capacity = bucket.capacity,
            "application received"
        );
        Ok(stored)
    }

    /// Accept or reject a pending application.
    ///
    /// With quota enforcement on, the accepted count is checked by the store inside the same
    /// write, so two admins racing for the last slot cannot both succeed.
    pub fn update_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
        today: NaiveDate,
    ) -> Result<Application, StaffingError> {
        if status == ApplicationStatus::Pending {
            return Err(StaffingError::Validation(
                "status must be accepted or rejected".to_string(),
            ));
        }

        let application = self.application(application_id)?;
        let job = self.job(&application.job_id)?;
        if job.completed {
            return Err(StaffingError::InvalidTransition(format!(
                "job {} is completed; applications are frozen",
                job.id
            )));
        }

        let accepting = status == ApplicationStatus::Accepted;
        if accepting && self.policy.block_banned_seekers {
            let reviews = self.store.reviews_for_seeker(&application.seeker_id)?;
            let reputation = self.reputation.assess(&reviews, today);
            if let Some(until) = reputation.banned_until.filter(|_| reputation.is_banned) {
                return Err(StaffingError::InvalidTransition(format!(
                    "seeker {} is banned until {}",
                    application.seeker_id, until
                )));
            }
        }

        let transition = StatusTransition {
            from: ApplicationStatus::Pending,
            to: status,
            accepted_limit: (accepting && self.policy.enforce_quota)
                .then(|| job.helpers_needed()),
        };
        let updated = self
            .store
            .transition_application(application_id, transition)
            .map_err(|err| transition_error(err, application_id, &job))?;

        let bucket = snapshot_for(self.store.as_ref(), &job)?;
        info!(
            application_id = %updated.id,
            job_id = %job.id,
            status = updated.status.label(),
            accepted = bucket.accepted,
            helpers_needed = bucket.helpers_needed,
            "application status updated"
        );
        if bucket.overflow > 0 {
            warn!(
                job_id = %job.id,
                overflow = bucket.overflow,
                "accepted helpers exceed the requested quota"
            );
        }

        if accepting {
            self.notifier.notify(
                Notice::new("application_accepted", updated.seeker_id.to_string())
                    .with("job_id", job.id.to_string())
                    .with("job_title", job.title.clone())
                    .with("event_start_date", job.event.event_start_date.to_string()),
            )?;
        }

        Ok(updated)
    }

    /// Return an accepted application to pending while the event has not happened yet.
    pub fn cancel_approval(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, StaffingError> {
        let application = self.application(application_id)?;
        let job = self.job(&application.job_id)?;
        if job.completed {
            return Err(StaffingError::InvalidTransition(format!(
                "job {} is completed; approvals can no longer be cancelled",
                job.id
            )));
        }

        let transition = StatusTransition {
            from: ApplicationStatus::Accepted,
            to: ApplicationStatus::Pending,
            accepted_limit: None,
        };
        let updated = self
            .store
            .transition_application(application_id, transition)
            .map_err(|err| transition_error(err, application_id, &job))?;

        info!(application_id = %updated.id, job_id = %job.id, "approval cancelled");
        Ok(updated)
    }

    /// Seeker-initiated removal of a still-pending application.
    pub fn withdraw(&self, application_id: &ApplicationId) -> Result<Application, StaffingError> {
        let removed = self
            .store
            .remove_application(application_id, ApplicationStatus::Pending)
            .map_err(|err| match err {
                RepositoryError::NotFound => StaffingError::not_found("application", application_id),
                RepositoryError::StaleStatus { found, .. } => {
                    StaffingError::InvalidTransition(format!(
                        "application {application_id} is {found}; only pending applications can be withdrawn"
                    ))
                }
                other => other.into(),
            })?;

        info!(application_id = %removed.id, job_id = %removed.job_id, "application withdrawn");
        Ok(removed)
    }

    pub fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, StaffingError> {
        Ok(self.store.list_applications(filter)?)
    }

    pub fn bucket(&self, job_id: &JobId) -> Result<BucketSnapshot, StaffingError> {
        let job = self.job(job_id)?;
        Ok(snapshot_for(self.store.as_ref(), &job)?)
    }

    fn application(&self, id: &ApplicationId) -> Result<Application, StaffingError> {
        self.store
            .fetch_application(id)?
            .ok_or_else(|| StaffingError::not_found("application", id))
    }

    fn job(&self, id: &JobId) -> Result<Job, StaffingError> {
        self.store
            .fetch_job(id)?
            .ok_or_else(|| StaffingError::not_found("job", id))
    }
}

fn transition_error(err: RepositoryError, id: &ApplicationId, job: &Job) -> StaffingError {
    match err {
        RepositoryError::NotFound => StaffingError::not_found("application", id),
        RepositoryError::StaleStatus { expected, found } => StaffingError::InvalidTransition(
            format!("application {id} is {found}, expected {expected}"),
        ),
        RepositoryError::QuotaReached { accepted, limit } => {
            StaffingError::InvalidTransition(format!(
                "job {} already has {accepted}/{limit} accepted helpers",
                job.id
            ))
        }
        other => other.into(),
    }
}
