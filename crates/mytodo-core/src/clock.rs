use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::retention;

/// The instant views and sweeps are evaluated at.
///
/// `today` is the local calendar date; `now` is the UTC instant used for
/// timestamp comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl Clock {
    pub fn local() -> Self {
        let now = Utc::now();
        Self {
            today: now.with_timezone(&Local).date_naive(),
            now,
        }
    }

    pub fn fixed(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self { today, now }
    }

    /// Clock whose `today` is the UTC date of `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            today: now.date_naive(),
            now,
        }
    }

    /// Completed tasks finished before this instant have left the logbox.
    pub fn logbox_cutoff(&self) -> DateTime<Utc> {
        retention::logbox_cutoff(self.now)
    }

    /// Trashed tasks deleted before this instant are due for purging.
    pub fn trash_cutoff(&self) -> DateTime<Utc> {
        retention::trash_cutoff(self.now)
    }
}
