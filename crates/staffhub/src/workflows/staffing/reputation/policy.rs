use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Red-flag ban rule: `threshold` flags (optionally only those within `lookback_days` of the
/// most recent one) ban the seeker for `duration_days` from the most recent flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanPolicy {
    pub threshold: u32,
    pub duration_days: i64,
    pub lookback_days: Option<i64>,
}

impl Default for BanPolicy {
    fn default() -> Self {
        Self {
            threshold: 3,
            duration_days: 90,
            lookback_days: None,
        }
    }
}

impl BanPolicy {
    /// End date of the ban the given flag dates trigger, if any.
    pub fn ban_end(&self, flag_dates: &[NaiveDate]) -> Option<NaiveDate> {
        let latest = *flag_dates.iter().max()?;

        let counted = match self.lookback_days {
            Some(days) => {
                let window_start = Duration::try_days(days)
                    .and_then(|window| latest.checked_sub_signed(window))
                    .unwrap_or(NaiveDate::MIN);
                flag_dates
                    .iter()
                    .filter(|date| **date >= window_start)
                    .count()
            }
            None => flag_dates.len(),
        };

        if (counted as u64) < u64::from(self.threshold) {
            return None;
        }

        // Bans running past the calendar's end last until `NaiveDate::MAX`.
        let saturated = if self.duration_days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        };
        Some(
            Duration::try_days(self.duration_days)
                .and_then(|duration| latest.checked_add_signed(duration))
                .unwrap_or(saturated),
        )
    }
}
