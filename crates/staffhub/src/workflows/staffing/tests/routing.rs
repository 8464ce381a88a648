use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::config::MarketplaceConfig;
use crate::workflows::staffing::domain::{ApplicationStatus, JobRequestSubmission, RequestStatus};
use crate::workflows::staffing::postings::JobView;
use crate::workflows::staffing::{staffing_router, StaffingDesk};

fn upcoming_submission(helpers_needed: u32) -> JobRequestSubmission {
    let start = Local::now().date_naive() + Duration::days(30);
    let mut submission = request_submission(helpers_needed);
    submission.event.event_start_date = start;
    submission.event.event_end_date = start + Duration::days(1);
    submission
}

fn router_for(desk: Arc<TestDesk>) -> Router {
    staffing_router(desk)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn submit_request_route_returns_created() {
    let (desk, _, _) = build_desk();
    let router = router_for(Arc::new(desk));
    let body = serde_json::to_value(upcoming_submission(2)).expect("serializes");

    let response = router
        .oneshot(json_request("POST", "/job-requests", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["request"]["status"], "pending");
    assert_eq!(payload["request"]["helpersNeeded"], 2);
}

#[tokio::test]
async fn invalid_request_maps_to_bad_request() {
    let (desk, _, _) = build_desk();
    let router = router_for(Arc::new(desk));
    let body = serde_json::to_value(upcoming_submission(0)).expect("serializes");

    let response = router
        .oneshot(json_request("POST", "/job-requests", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("helpersNeeded"));
}

#[tokio::test]
async fn approve_without_body_posts_an_active_job() {
    let (desk, _, _) = build_desk();
    let desk = Arc::new(desk);
    let request = desk
        .postings
        .submit_request(upcoming_submission(2))
        .expect("request");

    let response = router_for(desk.clone())
        .oneshot(
            Request::post(format!("/job-requests/{}/approve", request.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["request"]["status"], "approved");
    let job_id = payload["job"]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(payload["request"]["approvedJobId"], json!(job_id));

    let response = router_for(desk)
        .oneshot(get("/jobs?view=active"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let jobs = payload["jobs"].as_array().cloned().unwrap_or_default();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], json!(job_id));
    assert_eq!(jobs[0]["bucket"]["capacity"], 4);
}

#[tokio::test]
async fn approve_applies_admin_overrides_from_the_body() {
    let (desk, _, _) = build_desk();
    let desk = Arc::new(desk);
    let request = desk
        .postings
        .submit_request(upcoming_submission(2))
        .expect("request");

    let response = router_for(desk)
        .oneshot(json_request(
            "POST",
            &format!("/job-requests/{}/approve", request.id),
            json!({ "title": "Trade fair hosts", "payment": "EUR 13/h" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["job"]["title"], "Trade fair hosts");
    assert_eq!(payload["job"]["payment"], "EUR 13/h");
}

#[tokio::test]
async fn approve_with_malformed_overrides_leaves_the_request_pending() {
    let (desk, _, _) = build_desk();
    let desk = Arc::new(desk);
    let request = desk
        .postings
        .submit_request(upcoming_submission(2))
        .expect("request");
    let uri = format!("/job-requests/{}/approve", request.id);

    for body in [
        json!({ "payment": 12, "title": "Lower rate" }),
        json!({ "finalPayment": "EUR 13/h" }),
    ] {
        let response = router_for(desk.clone())
            .oneshot(json_request("POST", &uri, body))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json_body(response).await;
        assert!(payload["error"].is_string());
    }

    let pending = desk
        .postings
        .list_requests(Some(RequestStatus::Pending))
        .expect("requests listed");
    assert_eq!(pending.len(), 1);
    assert!(desk
        .postings
        .list_jobs(JobView::All, Local::now().date_naive())
        .expect("jobs listed")
        .is_empty());
}

#[tokio::test]
async fn undecodable_status_body_is_a_json_bad_request() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 1);
    let application = applied(&desk, &job, "s1");
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(json_request(
            "PATCH",
            &format!("/applications/{}", application.id),
            json!({ "status": "maybe" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"));
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("maybe"));
}

#[tokio::test]
async fn unknown_job_view_is_a_json_bad_request() {
    let (desk, _, _) = build_desk();
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(get("/jobs?view=someday"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn duplicate_application_maps_to_conflict() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 2);
    let seeker = register(&desk, "s1");
    let body = serde_json::to_value(application_submission(&job.id, &seeker)).expect("serializes");
    let desk = Arc::new(desk);

    let first = router_for(desk.clone())
        .oneshot(json_request("POST", "/applications", body.clone()))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router_for(desk)
        .oneshot(json_request("POST", "/applications", body))
        .await
        .expect("route executes");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_patch_accepts_application() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 1);
    let application = applied(&desk, &job, "s1");
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(json_request(
            "PATCH",
            &format!("/applications/{}", application.id),
            json!({ "status": "accepted" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["application"]["status"],
        ApplicationStatus::Accepted.label()
    );
}

#[tokio::test]
async fn rating_before_completion_is_unprocessable() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 1);
    let application = accepted(&desk, &job, "s1");
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(json_request(
            "POST",
            "/ratings",
            json!({
                "seekerId": application.seeker_id,
                "jobId": job.id,
                "jobTitle": job.title,
                "stars": 4,
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_seeker_stats_is_not_found() {
    let (desk, _, _) = build_desk();
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(get("/seekers/nobody/stats"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload.get("success").is_none());
}

#[tokio::test]
async fn seeker_stats_flatten_into_the_success_payload() {
    let (desk, _, _) = build_desk();
    register(&desk, "s1");
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(get("/seekers/s1/stats"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["avgRating"], "no ratings");
    assert_eq!(payload["isBanned"], json!(false));
    assert_eq!(payload["bannedUntil"], Value::Null);
}

#[tokio::test]
async fn roster_route_serves_csv() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 1);
    applied(&desk, &job, "s1");
    let router = router_for(Arc::new(desk));

    let response = router
        .oneshot(get(&format!("/jobs/{}/roster", job.id)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let text = String::from_utf8(body.to_vec()).expect("utf-8");
    assert!(text.starts_with("name,phone,age"));
    assert!(text.contains("Helper s1"));
}

#[tokio::test]
async fn archive_toggle_refuses_unarchive_with_met_quota() {
    let (desk, _, _) = build_desk();
    let job = posted_job(&desk, 1);
    accepted(&desk, &job, "s1");
    let desk = Arc::new(desk);

    let archived = router_for(desk.clone())
        .oneshot(json_request(
            "POST",
            &format!("/jobs/{}/archive", job.id),
            json!({ "archived": true }),
        ))
        .await
        .expect("route executes");
    assert_eq!(archived.status(), StatusCode::OK);

    let unarchived = router_for(desk)
        .oneshot(json_request(
            "POST",
            &format!("/jobs/{}/archive", job.id),
            json!({ "archived": false }),
        ))
        .await
        .expect("route executes");
    assert_eq!(unarchived.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_outage_maps_to_internal_error() {
    let desk = StaffingDesk::new(
        Arc::new(UnavailableStore),
        Arc::new(RecordingNotifier::default()),
        &MarketplaceConfig::default(),
    );
    let router = staffing_router(Arc::new(desk));

    let response = router
        .oneshot(get("/dashboard"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
