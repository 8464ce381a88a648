use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::config::MarketplaceConfig;
use crate::workflows::staffing::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSubmission, CompanyId, CustomData,
    EventDetails, Job, JobId, JobRequest, JobRequestSubmission, RequestId, Review, SeekerId,
    SeekerProfile, SeekerRegistration,
};
use crate::workflows::staffing::postings::JobApproval;
use crate::workflows::staffing::repository::{
    ApplicationFilter, EntityStore, JobTransition, Notice, Notifier, NotifyError,
    RepositoryError, StatusTransition,
};
use crate::workflows::staffing::{MemoryStore, StaffingDesk};

pub(super) type TestDesk = StaffingDesk<MemoryStore, RecordingNotifier>;

pub(super) fn today() -> NaiveDate {
    date(6, 1)
}

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

pub(super) fn event(helpers_needed: u32) -> EventDetails {
    EventDetails {
        event_type: "Trade fair".to_string(),
        location: "Hall 4, Messe Nord".to_string(),
        helpers_needed,
        event_start_date: date(6, 10),
        event_end_date: date(6, 11),
        event_start_time: None,
        event_end_time: None,
        contact_phone: "+49 30 5550100".to_string(),
    }
}

pub(super) fn request_submission(helpers_needed: u32) -> JobRequestSubmission {
    JobRequestSubmission {
        company_id: CompanyId::from("company-7"),
        company_name: "Northwind Events".to_string(),
        title: "Booth hosts".to_string(),
        event: event(helpers_needed),
        payment_offered: "EUR 15/h".to_string(),
        description: "Greet visitors and hand out brochures.".to_string(),
        custom_fields: Vec::new(),
    }
}

pub(super) fn application_submission(job_id: &JobId, seeker_id: &SeekerId) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: job_id.clone(),
        seeker_id: seeker_id.clone(),
        name: format!("Helper {seeker_id}"),
        phone: "+49 151 000000".to_string(),
        age: 24,
        city: "Berlin".to_string(),
        experience: "Two trade fairs".to_string(),
        availability: "Both days".to_string(),
        custom_data: CustomData::new(),
    }
}

pub(super) fn build_desk() -> (TestDesk, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    build_desk_with(MarketplaceConfig::default())
}

pub(super) fn build_desk_with(
    config: MarketplaceConfig,
) -> (TestDesk, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let desk = StaffingDesk::new(store.clone(), notifier.clone(), &config);
    (desk, store, notifier)
}

pub(super) fn posted_job(desk: &TestDesk, helpers_needed: u32) -> Job {
    let request = desk
        .postings
        .submit_request(request_submission(helpers_needed))
        .expect("request accepted");
    let (_, job) = desk
        .postings
        .approve(&request.id, JobApproval::default())
        .expect("request approved");
    job
}

pub(super) fn register(desk: &TestDesk, seeker: &str) -> SeekerId {
    desk.reputation
        .register_seeker(SeekerRegistration {
            seeker_id: SeekerId::from(seeker),
            name: format!("Seeker {seeker}"),
            phone: "+49 151 000000".to_string(),
            city: "Berlin".to_string(),
            age: 24,
        })
        .expect("seeker registered")
        .seeker_id
}

pub(super) fn applied(desk: &TestDesk, job: &Job, seeker: &str) -> Application {
    let seeker_id = register(desk, seeker);
    desk.applications
        .apply(application_submission(&job.id, &seeker_id))
        .expect("application accepted")
}

pub(super) fn accepted(desk: &TestDesk, job: &Job, seeker: &str) -> Application {
    let application = applied(desk, job, seeker);
    desk.applications
        .update_status(&application.id, ApplicationStatus::Accepted, today())
        .expect("application accepted")
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(super) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .map(|notice| notice.template)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl Notifier for OfflineNotifier {
    fn notify(&self, _notice: Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl EntityStore for UnavailableStore {
    fn insert_request(&self, _request: JobRequest) -> Result<JobRequest, RepositoryError> {
        offline()
    }

    fn fetch_request(&self, _id: &RequestId) -> Result<Option<JobRequest>, RepositoryError> {
        offline()
    }

    fn list_requests(&self) -> Result<Vec<JobRequest>, RepositoryError> {
        offline()
    }

    fn record_approval(
        &self,
        _id: &RequestId,
        _job: Job,
        _decided_at: DateTime<Utc>,
    ) -> Result<(JobRequest, Job), RepositoryError> {
        offline()
    }

    fn record_rejection(
        &self,
        _id: &RequestId,
        _reason: String,
        _decided_at: DateTime<Utc>,
    ) -> Result<JobRequest, RepositoryError> {
        offline()
    }

    fn fetch_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        offline()
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        offline()
    }

    fn transition_job(
        &self,
        _id: &JobId,
        _transition: JobTransition,
    ) -> Result<Job, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: Application,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn list_applications(
        &self,
        _filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn transition_application(
        &self,
        _id: &ApplicationId,
        _transition: StatusTransition,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn remove_application(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn insert_review(&self, _review: Review) -> Result<Review, RepositoryError> {
        offline()
    }

    fn reviews_for_seeker(&self, _seeker_id: &SeekerId) -> Result<Vec<Review>, RepositoryError> {
        offline()
    }

    fn insert_seeker(&self, _profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError> {
        offline()
    }

    fn fetch_seeker(&self, _id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError> {
        offline()
    }
}

/// Memory store that lets a queued job transition land right after the next job read,
/// standing in for a second admin acting between a service's read and its write.
#[derive(Default)]
pub(super) struct InterleavingStore {
    inner: MemoryStore,
    queued: Mutex<Option<JobTransition>>,
}

impl InterleavingStore {
    pub(super) fn after_next_job_fetch(&self, transition: JobTransition) {
        *self.queued.lock().expect("queue mutex poisoned") = Some(transition);
    }
}

impl EntityStore for InterleavingStore {
    fn insert_request(&self, request: JobRequest) -> Result<JobRequest, RepositoryError> {
        self.inner.insert_request(request)
    }

    fn fetch_request(&self, id: &RequestId) -> Result<Option<JobRequest>, RepositoryError> {
        self.inner.fetch_request(id)
    }

    fn list_requests(&self) -> Result<Vec<JobRequest>, RepositoryError> {
        self.inner.list_requests()
    }

    fn record_approval(
        &self,
        id: &RequestId,
        job: Job,
        decided_at: DateTime<Utc>,
    ) -> Result<(JobRequest, Job), RepositoryError> {
        self.inner.record_approval(id, job, decided_at)
    }

    fn record_rejection(
        &self,
        id: &RequestId,
        reason: String,
        decided_at: DateTime<Utc>,
    ) -> Result<JobRequest, RepositoryError> {
        self.inner.record_rejection(id, reason, decided_at)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let job = self.inner.fetch_job(id)?;
        let queued = self.queued.lock().expect("queue mutex poisoned").take();
        if let Some(transition) = queued {
            self.inner.transition_job(id, transition)?;
        }
        Ok(job)
    }

    fn list_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list_jobs()
    }

    fn transition_job(
        &self,
        id: &JobId,
        transition: JobTransition,
    ) -> Result<Job, RepositoryError> {
        self.inner.transition_job(id, transition)
    }

    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.list_applications(filter)
    }

    fn transition_application(
        &self,
        id: &ApplicationId,
        transition: StatusTransition,
    ) -> Result<Application, RepositoryError> {
        self.inner.transition_application(id, transition)
    }

    fn remove_application(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        self.inner.remove_application(id, expected)
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        self.inner.insert_review(review)
    }

    fn reviews_for_seeker(&self, seeker_id: &SeekerId) -> Result<Vec<Review>, RepositoryError> {
        self.inner.reviews_for_seeker(seeker_id)
    }

    fn insert_seeker(&self, profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError> {
        self.inner.insert_seeker(profile)
    }

    fn fetch_seeker(&self, id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError> {
        self.inner.fetch_seeker(id)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
