use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobRequest, RequestDecision,
    RequestId, Review, SeekerId, SeekerProfile,
};
use super::applications::BucketSnapshot;
use super::repository::{
    ApplicationFilter, EntityStore, JobFlags, JobTransition, RepositoryError, StatusTransition,
};

#[derive(Default)]
struct Tables {
    requests: BTreeMap<RequestId, JobRequest>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
    reviews: BTreeMap<(SeekerId, JobId), Review>,
    seekers: BTreeMap<SeekerId, SeekerProfile>,
}

/// Process-local store. A single lock covers every table, so each trait call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn pending_request<'a>(
    tables: &'a mut Tables,
    id: &RequestId,
) -> Result<&'a mut JobRequest, RepositoryError> {
    let request = tables
        .requests
        .get_mut(id)
        .ok_or(RepositoryError::NotFound)?;
    match request.decision {
        RequestDecision::Pending => Ok(request),
        _ => Err(RepositoryError::StaleStatus {
            expected: "pending",
            found: request.status().label(),
        }),
    }
}

impl EntityStore for MemoryStore {
    fn insert_request(&self, request: JobRequest) -> Result<JobRequest, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.requests.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch_request(&self, id: &RequestId) -> Result<Option<JobRequest>, RepositoryError> {
        Ok(self.tables()?.requests.get(id).cloned())
    }

    fn list_requests(&self) -> Result<Vec<JobRequest>, RepositoryError> {
        Ok(self.tables()?.requests.values().cloned().collect())
    }

    fn record_approval(
        &self,
        id: &RequestId,
        job: Job,
        decided_at: DateTime<Utc>,
    ) -> Result<(JobRequest, Job), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        let request = pending_request(&mut tables, id)?;
        request.decision = RequestDecision::Approved {
            approved_job_id: job.id.clone(),
            decided_at,
        };
        let request = request.clone();
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok((request, job))
    }

    fn record_rejection(
        &self,
        id: &RequestId,
        reason: String,
        decided_at: DateTime<Utc>,
    ) -> Result<JobRequest, RepositoryError> {
        let mut tables = self.tables()?;
        let request = pending_request(&mut tables, id)?;
        request.decision = RequestDecision::Rejected {
            rejection_reason: reason,
            decided_at,
        };
        Ok(request.clone())
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.get(id).cloned())
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.values().cloned().collect())
    }

    fn transition_job(
        &self,
        id: &JobId,
        transition: JobTransition,
    ) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        let (current, helpers_needed) = match tables.jobs.get(id) {
            Some(job) => (JobFlags::of(job), job.helpers_needed()),
            None => return Err(RepositoryError::NotFound),
        };
        if current != transition.from {
            return Err(RepositoryError::StaleStatus {
                expected: transition.from.label(),
                found: current.label(),
            });
        }

        if transition.require_open_bucket {
            let bucket = BucketSnapshot::from_applications(
                helpers_needed,
                tables
                    .applications
                    .values()
                    .filter(|application| &application.job_id == id),
            );
            if let Some(blocker) = bucket.unarchive_blocker() {
                return Err(RepositoryError::BucketClosed(blocker));
            }
        }

        let job = tables.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        job.archived = transition.to.archived;
        job.completed = transition.to.completed;
        Ok(job.clone())
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.applications.values().any(|existing| {
            existing.job_id == application.job_id && existing.seeker_id == application.seeker_id
        });
        if duplicate || tables.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables()?.applications.get(id).cloned())
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }

    fn transition_application(
        &self,
        id: &ApplicationId,
        transition: StatusTransition,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let (job_id, current) = match tables.applications.get(id) {
            Some(application) => (application.job_id.clone(), application.status),
            None => return Err(RepositoryError::NotFound),
        };
        if current != transition.from {
            return Err(RepositoryError::StaleStatus {
                expected: transition.from.label(),
                found: current.label(),
            });
        }

        if let Some(limit) = transition.accepted_limit {
            let accepted = tables
                .applications
                .values()
                .filter(|application| {
                    application.job_id == job_id
                        && application.status == ApplicationStatus::Accepted
                })
                .count() as u32;
            if accepted >= limit {
                return Err(RepositoryError::QuotaReached { accepted, limit });
            }
        }

        let application = tables
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        application.status = transition.to;
        Ok(application.clone())
    }

    fn remove_application(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let current = tables
            .applications
            .get(id)
            .map(|application| application.status)
            .ok_or(RepositoryError::NotFound)?;
        if current != expected {
            return Err(RepositoryError::StaleStatus {
                expected: expected.label(),
                found: current.label(),
            });
        }
        tables
            .applications
            .remove(id)
            .ok_or(RepositoryError::NotFound)
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut tables = self.tables()?;
        let key = (review.seeker_id.clone(), review.job_id.clone());
        if tables.reviews.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        tables.reviews.insert(key, review.clone());
        Ok(review)
    }

    fn reviews_for_seeker(&self, seeker_id: &SeekerId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .tables()?
            .reviews
            .values()
            .filter(|review| &review.seeker_id == seeker_id)
            .cloned()
            .collect())
    }

    fn insert_seeker(&self, profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.seekers.contains_key(&profile.seeker_id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .seekers
            .insert(profile.seeker_id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch_seeker(&self, id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError> {
        Ok(self.tables()?.seekers.get(id).cloned())
    }
}
