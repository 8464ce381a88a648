use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use staffhub::workflows::staffing::{Notice, Notifier, NotifyError};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in for the e-mail relay: logs every notice and keeps a copy for the demo output.
#[derive(Default)]
pub(crate) struct LoggingNotifier {
    sent: Mutex<Vec<Notice>>,
}

impl LoggingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notice> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for LoggingNotifier {
    fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
        info!(
            template = %notice.template,
            recipient = %notice.recipient,
            details = ?notice.details,
            "notification queued"
        );
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("outbox lock poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_days_only() {
        assert_eq!(
            parse_date(" 2025-08-16 "),
            Ok(NaiveDate::from_ymd_opt(2025, 8, 16).expect("valid date"))
        );
        assert!(parse_date("16/08/2025")
            .expect_err("wrong format")
            .contains("YYYY-MM-DD"));
    }

    #[test]
    fn logging_notifier_keeps_sent_notices() {
        let notifier = LoggingNotifier::default();
        notifier
            .notify(Notice::new("job_request_approved", "company-1").with("job_id", "job-000001"))
            .expect("notice accepted");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "company-1");
    }
}
