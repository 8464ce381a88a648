use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::applications::{ApplicationBucketService, BucketSnapshot};
use super::domain::{Application, Job, JobId};
use super::error::StaffingError;
use super::export;
use super::postings::JobPostingService;
use super::repository::{ApplicationFilter, EntityStore, Notifier};
use super::reputation::{ReputationCache, ReputationEngine, ReputationService, SeekerReputation};
use crate::config::MarketplaceConfig;

/// One applicant as shown on the admin review screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub application: Application,
    pub reputation: SeekerReputation,
}

/// Applicant review screen for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantReview {
    pub job: Job,
    pub bucket: BucketSnapshot,
    pub candidates: Vec<Candidate>,
}

/// Wires the three staffing services over one store and notifier.
pub struct StaffingDesk<S, N> {
    pub postings: JobPostingService<S, N>,
    pub applications: ApplicationBucketService<S, N>,
    pub reputation: ReputationService<S>,
    store: Arc<S>,
}

impl<S, N> StaffingDesk<S, N>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: &MarketplaceConfig) -> Self {
        let engine = ReputationEngine::new(config.ban);
        Self {
            postings: JobPostingService::new(store.clone(), notifier.clone()),
            applications: ApplicationBucketService::new(
                store.clone(),
                notifier,
                config.bucket,
                engine,
            ),
            reputation: ReputationService::new(
                store.clone(),
                engine,
                ReputationCache::new(config.reputation_cache_ttl),
            ),
            store,
        }
    }

    /// Applicants of a job with their reputation, accepted first, then pending, then rejected.
    pub fn applicant_review(
        &self,
        job_id: &JobId,
        today: NaiveDate,
    ) -> Result<ApplicantReview, StaffingError> {
        let job = self.job(job_id)?;
        let mut applications = self
            .store
            .list_applications(&ApplicationFilter::for_job(job_id))?;
        applications.sort_by_key(|application| {
            (export::status_rank(application.status), application.applied_at)
        });

        let bucket = BucketSnapshot::from_applications(job.helpers_needed(), &applications);
        let candidates = applications
            .into_iter()
            .map(|application| -> Result<Candidate, StaffingError> {
                let reputation = self.reputation.reputation(&application.seeker_id, today)?;
                Ok(Candidate {
                    application,
                    reputation,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApplicantReview {
            job,
            bucket,
            candidates,
        })
    }

    pub fn roster_csv(&self, job_id: &JobId) -> Result<String, StaffingError> {
        let job = self.job(job_id)?;
        let applications = self
            .store
            .list_applications(&ApplicationFilter::for_job(job_id))?;
        Ok(export::roster_csv(&job, &applications)?)
    }

    fn job(&self, job_id: &JobId) -> Result<Job, StaffingError> {
        self.store
            .fetch_job(job_id)?
            .ok_or_else(|| StaffingError::not_found("job", job_id))
    }
}
