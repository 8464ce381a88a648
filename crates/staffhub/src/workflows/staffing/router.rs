use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::desk::StaffingDesk;
use super::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, JobId, JobRequestSubmission,
    RequestId, RequestStatus, SeekerId, SeekerRegistration,
};
use super::error::StaffingError;
use super::extract::{JsonBody, OptionalJsonBody, QueryParams};
use super::postings::{JobApproval, JobView};
use super::repository::{ApplicationFilter, EntityStore, Notifier};
use super::reputation::{RatingSubmission, RedFlagSubmission};

type Desk<S, N> = State<Arc<StaffingDesk<S, N>>>;
type HandlerResult = Result<Response, StaffingError>;

/// HTTP surface for the staffing marketplace.
pub fn staffing_router<S, N>(desk: Arc<StaffingDesk<S, N>>) -> Router
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/job-requests",
            get(list_requests_handler::<S, N>).post(submit_request_handler::<S, N>),
        )
        .route(
            "/job-requests/:request_id/approve",
            post(approve_handler::<S, N>),
        )
        .route(
            "/job-requests/:request_id/reject",
            post(reject_handler::<S, N>),
        )
        .route("/jobs", get(list_jobs_handler::<S, N>))
        .route("/jobs/:job_id", get(job_handler::<S, N>))
        .route("/jobs/:job_id/archive", post(archive_handler::<S, N>))
        .route("/jobs/:job_id/complete", post(complete_handler::<S, N>))
        .route("/jobs/:job_id/applicants", get(applicants_handler::<S, N>))
        .route("/jobs/:job_id/roster", get(roster_handler::<S, N>))
        .route(
            "/applications",
            get(list_applications_handler::<S, N>).post(apply_handler::<S, N>),
        )
        .route(
            "/applications/:application_id",
            patch(update_status_handler::<S, N>).delete(withdraw_handler::<S, N>),
        )
        .route(
            "/applications/:application_id/cancel-approval",
            post(cancel_approval_handler::<S, N>),
        )
        .route("/seekers", post(register_seeker_handler::<S, N>))
        .route("/seekers/:seeker_id/stats", get(seeker_stats_handler::<S, N>))
        .route("/ratings", post(rating_handler::<S, N>))
        .route("/red-flags", post(red_flag_handler::<S, N>))
        .route("/dashboard", get(dashboard_handler::<S, N>))
        .with_state(desk)
}

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

fn success<T: Serialize>(status: StatusCode, payload: T) -> Response {
    (
        status,
        Json(Success {
            success: true,
            payload,
        }),
    )
        .into_response()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobListQuery {
    #[serde(default)]
    view: JobView,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RequestListQuery {
    status: Option<RequestStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectBody {
    reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArchiveBody {
    archived: bool,
}

pub(crate) async fn submit_request_handler<S, N>(
    State(desk): Desk<S, N>,
    JsonBody(submission): JsonBody<JobRequestSubmission>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let request = desk.postings.submit_request(submission)?;
    Ok(success(StatusCode::CREATED, json!({ "request": request })))
}

pub(crate) async fn list_requests_handler<S, N>(
    State(desk): Desk<S, N>,
    QueryParams(query): QueryParams<RequestListQuery>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let requests = desk.postings.list_requests(query.status)?;
    Ok(success(StatusCode::OK, json!({ "requests": requests })))
}

pub(crate) async fn approve_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(request_id): Path<String>,
    OptionalJsonBody(approval): OptionalJsonBody<JobApproval>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let approval = approval.unwrap_or_default();
    let (request, job) = desk
        .postings
        .approve(&RequestId(request_id), approval)?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "request": request, "job": job }),
    ))
}

pub(crate) async fn reject_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(request_id): Path<String>,
    JsonBody(body): JsonBody<RejectBody>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let request = desk.postings.reject(&RequestId(request_id), &body.reason)?;
    Ok(success(StatusCode::OK, json!({ "request": request })))
}

pub(crate) async fn list_jobs_handler<S, N>(
    State(desk): Desk<S, N>,
    QueryParams(query): QueryParams<JobListQuery>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let jobs = desk.postings.list_jobs(query.view, today())?;
    Ok(success(StatusCode::OK, json!({ "jobs": jobs })))
}

pub(crate) async fn job_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(job_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let job = desk.postings.job_summary(&JobId(job_id), today())?;
    Ok(success(StatusCode::OK, json!({ "job": job })))
}

pub(crate) async fn archive_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(job_id): Path<String>,
    JsonBody(body): JsonBody<ArchiveBody>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let job = desk.postings.set_archived(&JobId(job_id), body.archived)?;
    Ok(success(StatusCode::OK, json!({ "job": job })))
}

pub(crate) async fn complete_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(job_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let job = desk.postings.complete(&JobId(job_id))?;
    Ok(success(StatusCode::OK, json!({ "job": job })))
}

pub(crate) async fn applicants_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(job_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let review = desk.applicant_review(&JobId(job_id), today())?;
    Ok(success(StatusCode::OK, review))
}

pub(crate) async fn roster_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(job_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let disposition = format!("attachment; filename=\"{job_id}-roster.csv\"");
    let roster = desk.roster_csv(&JobId(job_id))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        roster,
    )
        .into_response())
}

pub(crate) async fn list_applications_handler<S, N>(
    State(desk): Desk<S, N>,
    QueryParams(filter): QueryParams<ApplicationFilter>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let applications = desk.applications.list(&filter)?;
    Ok(success(
        StatusCode::OK,
        json!({ "applications": applications }),
    ))
}

pub(crate) async fn apply_handler<S, N>(
    State(desk): Desk<S, N>,
    JsonBody(submission): JsonBody<ApplicationSubmission>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let application = desk.applications.apply(submission)?;
    Ok(success(
        StatusCode::CREATED,
        json!({ "application": application }),
    ))
}

pub(crate) async fn update_status_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(application_id): Path<String>,
    JsonBody(body): JsonBody<StatusBody>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let application =
        desk.applications
            .update_status(&ApplicationId(application_id), body.status, today())?;
    Ok(success(
        StatusCode::OK,
        json!({ "application": application }),
    ))
}

pub(crate) async fn cancel_approval_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(application_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let application = desk
        .applications
        .cancel_approval(&ApplicationId(application_id))?;
    Ok(success(
        StatusCode::OK,
        json!({ "application": application }),
    ))
}

pub(crate) async fn withdraw_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(application_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let removed = desk.applications.withdraw(&ApplicationId(application_id))?;
    Ok(success(
        StatusCode::OK,
        json!({ "withdrawnId": removed.id }),
    ))
}

pub(crate) async fn register_seeker_handler<S, N>(
    State(desk): Desk<S, N>,
    JsonBody(registration): JsonBody<SeekerRegistration>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let seeker = desk.reputation.register_seeker(registration)?;
    Ok(success(StatusCode::CREATED, json!({ "seeker": seeker })))
}

pub(crate) async fn seeker_stats_handler<S, N>(
    State(desk): Desk<S, N>,
    Path(seeker_id): Path<String>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let stats = desk.reputation.seeker_stats(&SeekerId(seeker_id), today())?;
    Ok(success(StatusCode::OK, stats))
}

pub(crate) async fn rating_handler<S, N>(
    State(desk): Desk<S, N>,
    JsonBody(submission): JsonBody<RatingSubmission>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let review = desk.reputation.rate(submission, today())?;
    Ok(success(StatusCode::CREATED, json!({ "review": review })))
}

pub(crate) async fn red_flag_handler<S, N>(
    State(desk): Desk<S, N>,
    JsonBody(submission): JsonBody<RedFlagSubmission>,
) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let review = desk.reputation.flag(submission, today())?;
    Ok(success(StatusCode::CREATED, json!({ "review": review })))
}

pub(crate) async fn dashboard_handler<S, N>(State(desk): Desk<S, N>) -> HandlerResult
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let dashboard = desk.postings.dashboard(today())?;
    Ok(success(StatusCode::OK, json!({ "dashboard": dashboard })))
}
