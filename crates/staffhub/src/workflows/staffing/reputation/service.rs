use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::domain::{
    JobId, Review, ReviewOutcome, SeekerId, SeekerProfile, SeekerRegistration,
};
use super::super::error::StaffingError;
use super::super::repository::{ApplicationFilter, EntityStore, RepositoryError};
use super::cache::ReputationCache;
use super::engine::{AverageRating, ReputationEngine, SeekerReputation};
use super::gate::ensure_reviewable;

/// Body of `POST /ratings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub seeker_id: SeekerId,
    pub job_id: JobId,
    #[serde(default)]
    pub job_title: Option<String>,
    pub stars: u8,
}

/// Body of `POST /red-flags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlagSubmission {
    pub seeker_id: SeekerId,
    pub job_id: JobId,
    #[serde(default)]
    pub job_title: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub job_id: JobId,
    pub job_title: String,
    pub stars: u8,
    pub rated_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlagEntry {
    pub job_id: JobId,
    pub job_title: String,
    pub reason: String,
    pub flagged_on: NaiveDate,
}

/// Payload of `GET /seekers/:id/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerStats {
    pub seeker_info: SeekerProfile,
    pub avg_rating: AverageRating,
    pub ratings: Vec<RatingEntry>,
    pub red_flags: Vec<RedFlagEntry>,
    pub red_flag_count: u32,
    pub is_banned: bool,
    pub banned_until: Option<NaiveDate>,
}

/// Seeker registry, post-event reviews, and cached reputation lookups.
pub struct ReputationService<S> {
    store: Arc<S>,
    engine: ReputationEngine,
    cache: ReputationCache,
}

impl<S> ReputationService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, engine: ReputationEngine, cache: ReputationCache) -> Self {
        Self {
            store,
            engine,
            cache,
        }
    }

    pub fn engine(&self) -> ReputationEngine {
        self.engine
    }

    pub fn register_seeker(
        &self,
        registration: SeekerRegistration,
    ) -> Result<SeekerProfile, StaffingError> {
        if registration.seeker_id.0.trim().is_empty() || registration.name.trim().is_empty() {
            return Err(StaffingError::Validation(
                "seeker id and name are required".to_string(),
            ));
        }

        let profile = SeekerProfile {
            seeker_id: registration.seeker_id,
            name: registration.name.trim().to_string(),
            phone: registration.phone,
            city: registration.city,
            age: registration.age,
            registered_at: Utc::now(),
        };
        let seeker_id = profile.seeker_id.clone();
        self.store.insert_seeker(profile).map_err(|err| match err {
            RepositoryError::Conflict => {
                StaffingError::PreconditionFailed(format!("seeker {seeker_id} is already registered"))
            }
            other => other.into(),
        })
    }

    pub fn rate(
        &self,
        submission: RatingSubmission,
        today: NaiveDate,
    ) -> Result<Review, StaffingError> {
        if !(1..=5).contains(&submission.stars) {
            return Err(StaffingError::Validation(format!(
                "stars must be between 1 and 5, got {}",
                submission.stars
            )));
        }

        self.record(
            submission.seeker_id,
            submission.job_id,
            submission.job_title,
            ReviewOutcome::Rated {
                stars: submission.stars,
            },
            today,
        )
    }

    pub fn flag(
        &self,
        submission: RedFlagSubmission,
        today: NaiveDate,
    ) -> Result<Review, StaffingError> {
        let reason = submission.reason.trim();
        if reason.is_empty() {
            return Err(StaffingError::Validation(
                "a red flag needs a reason".to_string(),
            ));
        }

        self.record(
            submission.seeker_id,
            submission.job_id,
            submission.job_title,
            ReviewOutcome::Flagged {
                reason: reason.to_string(),
            },
            today,
        )
    }

    /// Current standing for applicant screens; served from the cache when fresh.
    pub fn reputation(
        &self,
        seeker_id: &SeekerId,
        today: NaiveDate,
    ) -> Result<SeekerReputation, StaffingError> {
        if let Some(cached) = self.cache.get(seeker_id, today) {
            return Ok(cached);
        }

        let generation = self.cache.generation(seeker_id);
        let reviews = self.store.reviews_for_seeker(seeker_id)?;
        let reputation = self.engine.assess(&reviews, today);
        self.cache
            .put(seeker_id.clone(), generation, today, reputation.clone());
        Ok(reputation)
    }

    pub fn seeker_stats(
        &self,
        seeker_id: &SeekerId,
        today: NaiveDate,
    ) -> Result<SeekerStats, StaffingError> {
        let seeker_info = self
            .store
            .fetch_seeker(seeker_id)?
            .ok_or_else(|| StaffingError::not_found("seeker", seeker_id))?;

        let generation = self.cache.generation(seeker_id);
        let reviews = self.store.reviews_for_seeker(seeker_id)?;
        let reputation = self.engine.assess(&reviews, today);
        self.cache
            .put(seeker_id.clone(), generation, today, reputation.clone());

        let mut ratings = Vec::new();
        let mut red_flags = Vec::new();
        for review in reviews {
            match review.outcome {
                ReviewOutcome::Rated { stars } => ratings.push(RatingEntry {
                    job_id: review.job_id,
                    job_title: review.job_title,
                    stars,
                    rated_on: review.reviewed_on,
                }),
                ReviewOutcome::Flagged { reason } => red_flags.push(RedFlagEntry {
                    job_id: review.job_id,
                    job_title: review.job_title,
                    reason,
                    flagged_on: review.reviewed_on,
                }),
            }
        }

        Ok(SeekerStats {
            seeker_info,
            avg_rating: reputation.avg_rating,
            ratings,
            red_flags,
            red_flag_count: reputation.red_flag_count,
            is_banned: reputation.is_banned,
            banned_until: reputation.banned_until,
        })
    }

    fn record(
        &self,
        seeker_id: SeekerId,
        job_id: JobId,
        job_title: Option<String>,
        outcome: ReviewOutcome,
        today: NaiveDate,
    ) -> Result<Review, StaffingError> {
        let job = self
            .store
            .fetch_job(&job_id)?
            .ok_or_else(|| StaffingError::not_found("job", &job_id))?;

        let filter = ApplicationFilter {
            job_id: Some(job_id.clone()),
            seeker_id: Some(seeker_id.clone()),
        };
        let application = self.store.list_applications(&filter)?.into_iter().next();
        ensure_reviewable(&job, application.as_ref())?;

        let job_title = job_title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| job.title.clone());

        let review = Review {
            seeker_id,
            job_id,
            job_title,
            reviewed_on: today,
            outcome,
        };

        let stored = self.store.insert_review(review).map_err(|err| match err {
            RepositoryError::Conflict => StaffingError::PreconditionFailed(format!(
                "seeker was already reviewed for job {}",
                job.id
            )),
            other => other.into(),
        })?;
        self.cache.invalidate(&stored.seeker_id);

        info!(
            seeker_id = %stored.seeker_id,
            job_id = %stored.job_id,
            red_flag = stored.is_red_flag(),
            "post-event review recorded"
        );
        Ok(stored)
    }
}
