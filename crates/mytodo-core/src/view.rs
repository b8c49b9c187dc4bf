use std::cmp::Ordering;
use std::fmt;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::task::Task;

/// A named, predefined filter over tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    Today,
    Upcoming,
    Important,
    #[default]
    All,
    Logbox,
    Trash,
    Section(i64),
}

impl View {
    /// Views that exist regardless of which sections are defined, in sidebar order.
    pub const NAMED: &[View] = &[
        View::Today,
        View::Upcoming,
        View::Important,
        View::All,
        View::Logbox,
        View::Trash,
    ];

    /// Query token for the named views. Sections have none.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            View::Today => Some("today"),
            View::Upcoming => Some("upcoming"),
            View::Important => Some("important"),
            View::All => Some("all"),
            View::Logbox => Some("logbox"),
            View::Trash => Some("trash"),
            View::Section(_) => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            View::Today => "Today",
            View::Upcoming => "Upcoming",
            View::Important => "Important",
            View::All => "All",
            View::Logbox => "Logbox",
            View::Trash => "Trash",
            View::Section(_) => "Section",
        }
    }

    pub fn parse_str(s: &str) -> Result<Self, ValidationError> {
        match s {
            "today" => Ok(View::Today),
            "upcoming" => Ok(View::Upcoming),
            "important" => Ok(View::Important),
            "all" => Ok(View::All),
            "logbox" => Ok(View::Logbox),
            "trash" => Ok(View::Trash),
            "section" => Err(ValidationError::MissingSectionId),
            other => Err(ValidationError::UnknownView(other.to_string())),
        }
    }

    /// Resolve the `view` / `section_id` query pair. A section id wins over
    /// the view token; neither means `all`.
    pub fn from_query(view: Option<&str>, section_id: Option<i64>) -> Result<Self, ValidationError> {
        match (section_id, view) {
            (Some(id), _) => Ok(View::Section(id)),
            (None, None) => Ok(View::All),
            (None, Some(token)) => View::parse_str(token),
        }
    }

    pub fn query_string(&self) -> String {
        match self {
            View::Section(id) => format!("section_id={id}"),
            named => format!("view={}", named.token().unwrap_or("all")),
        }
    }

    /// In-memory form of the view predicate the database evaluates.
    pub fn matches(&self, task: &Task, clock: &Clock) -> bool {
        match self {
            View::Trash => task.is_deleted,
            _ if task.is_deleted => false,
            View::Today => !task.is_completed && task.due_date == Some(clock.today),
            View::Upcoming => !task.is_completed && task.due_date.is_some_and(|d| d > clock.today),
            View::Important => !task.is_completed && task.is_important,
            View::All => !task.is_completed,
            View::Logbox => {
                task.is_completed
                    && task
                        .completed_at
                        .is_some_and(|at| at >= clock.logbox_cutoff())
            }
            View::Section(id) => !task.is_completed && task.section_id == Some(*id),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Section(id) => write!(f, "section:{id}"),
            named => f.write_str(named.token().unwrap_or("all")),
        }
    }
}

/// Listing order shared by every view: incomplete first, then by due date
/// with undated tasks last, newest first, highest id first.
pub fn compare_for_listing(a: &Task, b: &Task) -> Ordering {
    a.is_completed
        .cmp(&b.is_completed)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ReminderType;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn clock() -> Clock {
        Clock::fixed(
            NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap(),
        )
    }

    fn task(id: i64) -> Task {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            section_id: None,
            due_date: None,
            is_important: false,
            is_completed: false,
            completed_at: None,
            is_deleted: false,
            deleted_at: None,
            reminder_type: ReminderType::None,
            reminder_day: None,
            last_reminded_on: None,
            created_at: at,
            updated_at: at,
            section_name: None,
            section_icon: None,
            attachment_count: 0,
        }
    }

    #[test]
    fn undated_task_is_never_today_or_upcoming() {
        let c = clock();
        let t = task(1);
        assert!(!View::Today.matches(&t, &c));
        assert!(!View::Upcoming.matches(&t, &c));
        assert!(View::All.matches(&t, &c));
    }

    #[test]
    fn due_today_is_today_not_upcoming() {
        let c = clock();
        let mut t = task(1);
        t.due_date = Some(c.today);
        assert!(View::Today.matches(&t, &c));
        assert!(!View::Upcoming.matches(&t, &c));
        assert!(!t.is_overdue(c.today));

        t.due_date = c.today.succ_opt();
        assert!(View::Upcoming.matches(&t, &c));
    }

    #[test]
    fn trashed_task_only_in_trash() {
        let c = clock();
        let mut t = task(1);
        t.is_important = true;
        t.section_id = Some(3);
        t.is_deleted = true;
        t.deleted_at = Some(c.now);
        for view in View::NAMED.iter().chain([&View::Section(3)]) {
            assert_eq!(view.matches(&t, &c), *view == View::Trash, "{view}");
        }
    }

    #[test]
    fn logbox_holds_six_months_of_completions() {
        let c = clock();
        let mut t = task(1);
        t.is_completed = true;
        t.completed_at = Some(c.now - Duration::days(30));
        assert!(View::Logbox.matches(&t, &c));
        assert!(!View::All.matches(&t, &c));

        t.completed_at = Some(c.now - Duration::days(200));
        assert!(!View::Logbox.matches(&t, &c));
    }

    #[test]
    fn query_resolution() {
        assert_eq!(View::from_query(None, None), Ok(View::All));
        assert_eq!(View::from_query(Some("today"), None), Ok(View::Today));
        assert_eq!(View::from_query(Some("today"), Some(4)), Ok(View::Section(4)));
        assert_eq!(
            View::from_query(Some("someday"), None),
            Err(ValidationError::UnknownView("someday".into()))
        );
        assert_eq!(
            View::from_query(Some("section"), None),
            Err(ValidationError::MissingSectionId)
        );
    }

    #[test]
    fn query_string_matches_parser() {
        for view in View::NAMED.iter().chain([&View::Section(9)]) {
            let qs = view.query_string();
            let parsed = match qs.split_once('=') {
                Some(("view", token)) => View::from_query(Some(token), None),
                Some(("section_id", id)) => View::from_query(None, id.parse().ok()),
                _ => panic!("bad query string {qs}"),
            };
            assert_eq!(parsed, Ok(*view));
        }
    }

    #[test]
    fn listing_order() {
        let c = clock();
        let mut done = task(1);
        done.is_completed = true;
        done.due_date = Some(c.today);
        let mut dated_late = task(2);
        dated_late.due_date = c.today.succ_opt();
        let mut dated_early = task(3);
        dated_early.due_date = Some(c.today);
        let undated_old = task(4);
        let mut undated_new = task(5);
        undated_new.created_at += Duration::hours(1);
        let undated_tie = task(6);

        let mut tasks = vec![
            done.clone(),
            undated_old.clone(),
            dated_late.clone(),
            undated_tie.clone(),
            undated_new.clone(),
            dated_early.clone(),
        ];
        tasks.sort_by(compare_for_listing);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 5, 6, 4, 1]);
    }
}
