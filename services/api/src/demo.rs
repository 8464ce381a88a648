use crate::infra::LoggingNotifier;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use staffhub::config::MarketplaceConfig;
use staffhub::error::AppError;
use staffhub::workflows::staffing::{
    ApplicationStatus, ApplicationSubmission, CompanyId, EventDetails, Job, JobApproval,
    JobRequestSubmission, JobView, MemoryStore, RatingSubmission, RedFlagSubmission, SeekerId,
    SeekerRegistration, StaffingDesk,
};
use std::sync::Arc;

type DemoDesk = StaffingDesk<MemoryStore, LoggingNotifier>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date the demo treats as today (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Helpers the demo company asks for.
    #[arg(long, default_value_t = 2)]
    pub(crate) helpers: u32,
    /// Skip the red-flag ban walkthrough.
    #[arg(long)]
    pub(crate) skip_ban: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        helpers,
        skip_ban,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let helpers = helpers.max(1);

    let config = MarketplaceConfig::default();
    let notifier = Arc::new(LoggingNotifier::default());
    let desk = StaffingDesk::new(
        Arc::new(MemoryStore::default()),
        notifier.clone(),
        &config,
    );

    println!("StaffHub lifecycle demo (today = {today})");
    let job = post_job(&desk, helpers, today + Duration::days(7))?;
    println!(
        "- Posted '{}' ({}) for {} helper(s) on {}",
        job.title, job.id, helpers, job.event.event_start_date
    );

    let bucket_size = helpers * 2;
    let mut applications = Vec::new();
    for index in 0..bucket_size {
        let seeker_id = register(&desk, &format!("seeker-{:02}", index + 1))?;
        applications.push(desk.applications.apply(submission(&job, &seeker_id))?);
    }
    let bucket = desk.applications.bucket(&job.id)?;
    println!(
        "- Received {}/{} applications (bucket full: {})",
        bucket.total, bucket.capacity, bucket.full
    );

    for application in applications.iter().take(helpers as usize) {
        desk.applications
            .update_status(&application.id, ApplicationStatus::Accepted, today)?;
    }
    if let Some(extra) = applications.get(helpers as usize) {
        match desk
            .applications
            .update_status(&extra.id, ApplicationStatus::Accepted, today)
        {
            Ok(_) => println!("  Extra acceptance went through (quota not enforced)"),
            Err(err) => println!("  Extra acceptance refused: {err}"),
        }
    }

    let first = &applications[0];
    desk.applications.cancel_approval(&first.id)?;
    desk.applications
        .update_status(&first.id, ApplicationStatus::Accepted, today)?;
    println!("- Cancelled and re-accepted {} without losing the slot", first.name);

    desk.postings.archive(&job.id)?;
    let active = desk.postings.list_jobs(JobView::Active, today)?;
    println!("- Archived the job; {} job(s) remain on the seeker board", active.len());
    match desk.postings.unarchive(&job.id) {
        Ok(_) => println!("  Job returned to the board"),
        Err(err) => println!("  Unarchive refused: {err}"),
    }

    let accepted_seeker = first.seeker_id.clone();
    match desk.reputation.rate(rating(&job, &accepted_seeker, 4), today) {
        Ok(_) => println!("  Unexpected: review accepted before completion"),
        Err(err) => println!("- Early review refused: {err}"),
    }

    desk.postings.complete(&job.id)?;
    let review_day = job.event.event_end_date + Duration::days(1);
    desk.reputation
        .rate(rating(&job, &accepted_seeker, 4), review_day)?;
    let stats = desk.reputation.seeker_stats(&accepted_seeker, review_day)?;
    println!(
        "- Completed the job; {} now averages {} over {} rating(s)",
        accepted_seeker,
        stats.avg_rating,
        stats.ratings.len()
    );

    if !skip_ban {
        ban_walkthrough(&desk, &config, today)?;
    }

    let dashboard = desk.postings.dashboard(today)?;
    match serde_json::to_string_pretty(&dashboard) {
        Ok(json) => println!("\nDashboard:\n{json}"),
        Err(err) => println!("\nDashboard unavailable: {err}"),
    }

    println!("\nNotifications sent:");
    for notice in notifier.sent() {
        println!("  - {} -> {}", notice.template, notice.recipient);
    }

    Ok(())
}

fn ban_walkthrough(
    desk: &DemoDesk,
    config: &MarketplaceConfig,
    today: NaiveDate,
) -> Result<(), AppError> {
    let threshold = config.ban.threshold;
    println!(
        "\nRed-flag walkthrough ({} flags ban for {} days)",
        threshold, config.ban.duration_days
    );
    let seeker_id = register(desk, "seeker-late")?;

    let mut flagged_on = today;
    for round in 0..threshold {
        let event_day = today + Duration::days(i64::from(round) * 7);
        let job = post_job(desk, 1, event_day)?;
        let application = desk.applications.apply(submission(&job, &seeker_id))?;
        desk.applications
            .update_status(&application.id, ApplicationStatus::Accepted, today)?;
        desk.postings.complete(&job.id)?;

        flagged_on = job.event.event_end_date + Duration::days(1);
        desk.reputation.flag(
            RedFlagSubmission {
                seeker_id: seeker_id.clone(),
                job_id: job.id.clone(),
                job_title: None,
                reason: "Did not show up for the shift".to_string(),
            },
            flagged_on,
        )?;
        let reputation = desk.reputation.reputation(&seeker_id, flagged_on)?;
        println!(
            "- Flag {} on {}: banned = {}{}",
            round + 1,
            flagged_on,
            reputation.is_banned,
            reputation
                .banned_until
                .map(|until| format!(" (until {until})"))
                .unwrap_or_default()
        );
    }

    let after = flagged_on + Duration::days(config.ban.duration_days);
    let reputation = desk.reputation.reputation(&seeker_id, after)?;
    println!("- On {after}: banned = {}", reputation.is_banned);
    Ok(())
}

fn post_job(desk: &DemoDesk, helpers: u32, event_day: NaiveDate) -> Result<Job, AppError> {
    let request = desk.postings.submit_request(JobRequestSubmission {
        company_id: CompanyId::from("company-demo"),
        company_name: "Harbor Expo Services".to_string(),
        title: "Registration desk staff".to_string(),
        event: EventDetails {
            event_type: "Conference".to_string(),
            location: "Harbor Convention Center".to_string(),
            helpers_needed: helpers,
            event_start_date: event_day,
            event_end_date: event_day,
            event_start_time: None,
            event_end_time: None,
            contact_phone: "+1 555 0100".to_string(),
        },
        payment_offered: "USD 18/h".to_string(),
        description: "Badge pickup and attendee check-in.".to_string(),
        custom_fields: Vec::new(),
    })?;
    let (_, job) = desk.postings.approve(&request.id, JobApproval::default())?;
    Ok(job)
}

fn register(desk: &DemoDesk, id: &str) -> Result<SeekerId, AppError> {
    let profile = desk.reputation.register_seeker(SeekerRegistration {
        seeker_id: SeekerId::from(id),
        name: format!("Demo {id}"),
        phone: "+1 555 0199".to_string(),
        city: "Portside".to_string(),
        age: 21,
    })?;
    Ok(profile.seeker_id)
}

fn submission(job: &Job, seeker_id: &SeekerId) -> ApplicationSubmission {
    ApplicationSubmission {
        job_id: job.id.clone(),
        seeker_id: seeker_id.clone(),
        name: format!("Demo {seeker_id}"),
        phone: "+1 555 0199".to_string(),
        age: 21,
        city: "Portside".to_string(),
        experience: "Front-of-house volunteer".to_string(),
        availability: "Full day".to_string(),
        custom_data: Default::default(),
    }
}

fn rating(job: &Job, seeker_id: &SeekerId, stars: u8) -> RatingSubmission {
    RatingSubmission {
        seeker_id: seeker_id.clone(),
        job_id: job.id.clone(),
        job_title: None,
        stars,
    }
}
