use super::super::domain::{Application, ApplicationStatus, Job};
use super::super::error::StaffingError;

/// Reviews are post-event only: the job must be completed and the seeker must have been
/// accepted on it.
pub(crate) fn ensure_reviewable(
    job: &Job,
    application: Option<&Application>,
) -> Result<(), StaffingError> {
    if !job.completed {
        return Err(StaffingError::ReviewNotYetEligible(format!(
            "job {} has not been marked completed",
            job.id
        )));
    }

    match application {
        Some(application) if application.status == ApplicationStatus::Accepted => Ok(()),
        Some(application) => Err(StaffingError::ReviewNotYetEligible(format!(
            "application {} is {}, only accepted helpers can be reviewed",
            application.id, application.status
        ))),
        None => Err(StaffingError::ReviewNotYetEligible(format!(
            "seeker has no application on job {}",
            job.id
        ))),
    }
}
