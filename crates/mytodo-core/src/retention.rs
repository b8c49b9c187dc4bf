use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

pub const TRASH_RETENTION_DAYS: i64 = 30;
pub const LOGBOX_RETENTION_MONTHS: u32 = 6;

pub fn trash_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(TRASH_RETENTION_DAYS)
}

pub fn logbox_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(LOGBOX_RETENTION_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// What a sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub trashed_purged: u64,
    pub completed_purged: u64,
}

impl PurgeReport {
    pub fn total(&self) -> u64 {
        self.trashed_purged + self.completed_purged
    }
}
