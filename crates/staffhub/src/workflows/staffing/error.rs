use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::{JobId, SeekerId};
use super::export::ExportError;
use super::repository::{NotifyError, RepositoryError};

/// Error raised by the lifecycle, bucket, and reputation services.
#[derive(Debug, thiserror::Error)]
pub enum StaffingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("seeker {seeker_id} already applied to job {job_id}")]
    DuplicateApplication { job_id: JobId, seeker_id: SeekerId },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("review not yet eligible: {0}")]
    ReviewNotYetEligible(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotifyError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl StaffingError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StaffingError::Validation(_) => StatusCode::BAD_REQUEST,
            StaffingError::NotFound { .. } => StatusCode::NOT_FOUND,
            StaffingError::PreconditionFailed(_)
            | StaffingError::InvalidTransition(_)
            | StaffingError::DuplicateApplication { .. } => StatusCode::CONFLICT,
            StaffingError::ReviewNotYetEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StaffingError::Repository(_)
            | StaffingError::Notification(_)
            | StaffingError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StaffingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "staffing operation failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
