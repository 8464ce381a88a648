use csv::Writer;
use serde::Serialize;

use super::domain::{Application, ApplicationStatus, Job};

/// Failure while rendering a roster export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to encode roster row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("roster is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Serialize)]
struct RosterRow<'a> {
    name: &'a str,
    phone: &'a str,
    age: u8,
    city: &'a str,
    experience: &'a str,
    availability: &'a str,
    status: &'static str,
    applied_at: String,
}

/// Render a job's applicants as CSV, accepted helpers first, then by application time.
pub fn roster_csv(job: &Job, applications: &[Application]) -> Result<String, ExportError> {
    let mut ordered: Vec<&Application> = applications
        .iter()
        .filter(|application| application.job_id == job.id)
        .collect();
    ordered.sort_by_key(|application| (status_rank(application.status), application.applied_at));

    let mut writer = Writer::from_writer(Vec::new());
    for application in ordered {
        writer.serialize(RosterRow {
            name: &application.name,
            phone: &application.phone,
            age: application.age,
            city: &application.city,
            experience: &application.experience,
            availability: &application.availability,
            status: application.status.label(),
            applied_at: application.applied_at.to_rfc3339(),
        })?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub(crate) fn status_rank(status: ApplicationStatus) -> u8 {
    match status {
        ApplicationStatus::Accepted => 0,
        ApplicationStatus::Pending => 1,
        ApplicationStatus::Rejected => 2,
    }
}
