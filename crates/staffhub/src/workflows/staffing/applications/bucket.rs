use serde::{Deserialize, Serialize};

use super::super::domain::{Application, ApplicationStatus, Job};
use super::super::repository::{ApplicationFilter, EntityStore, RepositoryError};

/// Total applications a job holds before unarchiving is blocked, per helper needed.
pub const BUCKET_MULTIPLIER: u32 = 2;

/// Knobs for acceptance rules layered on the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPolicy {
    /// Refuse acceptances once `helpers_needed` applications are accepted.
    pub enforce_quota: bool,
    /// Refuse accepting seekers whose reputation currently carries a ban.
    pub block_banned_seekers: bool,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            enforce_quota: true,
            block_banned_seekers: false,
        }
    }
}

/// Point-in-time counts for one job's applicant bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSnapshot {
    pub helpers_needed: u32,
    pub capacity: u32,
    pub accepted: u32,
    pub pending: u32,
    pub rejected: u32,
    pub total: u32,
    pub quota_met: bool,
    pub full: bool,
    /// Accepted helpers beyond the quota; only non-zero when quota enforcement is off.
    pub overflow: u32,
}

impl BucketSnapshot {
    pub fn from_applications<'a, I>(helpers_needed: u32, applications: I) -> Self
    where
        I: IntoIterator<Item = &'a Application>,
    {
        let (mut accepted, mut pending, mut rejected) = (0u32, 0u32, 0u32);
        for application in applications {
            match application.status {
                ApplicationStatus::Accepted => accepted += 1,
                ApplicationStatus::Pending => pending += 1,
                ApplicationStatus::Rejected => rejected += 1,
            }
        }

        let capacity = helpers_needed.saturating_mul(BUCKET_MULTIPLIER);
        let total = accepted + pending + rejected;

        Self {
            helpers_needed,
            capacity,
            accepted,
            pending,
            rejected,
            total,
            quota_met: accepted >= helpers_needed,
            full: total >= capacity,
            overflow: accepted.saturating_sub(helpers_needed),
        }
    }

    pub fn open_slots(&self) -> u32 {
        self.helpers_needed.saturating_sub(self.accepted)
    }

    /// Reason an archived job may not return to the seeker-facing listing, if any.
    pub fn unarchive_blocker(&self) -> Option<String> {
        if self.quota_met {
            return Some(format!(
                "helper quota already met ({}/{} accepted)",
                self.accepted, self.helpers_needed
            ));
        }
        if self.full {
            return Some(format!(
                "applicant bucket is full ({}/{} applications); triage pending applicants first",
                self.total, self.capacity
            ));
        }
        None
    }
}

pub(crate) fn snapshot_for<S: EntityStore + ?Sized>(
    store: &S,
    job: &Job,
) -> Result<BucketSnapshot, RepositoryError> {
    let applications = store.list_applications(&ApplicationFilter::for_job(&job.id))?;
    Ok(BucketSnapshot::from_applications(
        job.helpers_needed(),
        &applications,
    ))
}
