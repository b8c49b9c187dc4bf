use serde::{Deserialize, Serialize};

use crate::view::View;

/// Badge counts shown next to each view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub today: i64,
    pub overdue: i64,
    pub upcoming: i64,
    pub important: i64,
    pub trash: i64,
    pub logbox: i64,
    pub reminders: i64,
}

impl TaskStats {
    /// Badge for a view, if it has one.
    pub fn count_for(&self, view: &View) -> Option<i64> {
        match view {
            View::Today => Some(self.today),
            View::Upcoming => Some(self.upcoming),
            View::Important => Some(self.important),
            View::Logbox => Some(self.logbox),
            View::Trash => Some(self.trash),
            View::All | View::Section(_) => None,
        }
    }
}
