//! View predicates shared by both backends.
//!
//! Booleans are written as bare columns (`t.is_completed`, `NOT t.is_deleted`)
//! which both SQLite integers and Postgres booleans accept. Only the
//! placeholder syntax differs.

use chrono::{DateTime, NaiveDate, Utc};

use mytodo_core::clock::Clock;
use mytodo_core::view::View;

/// Columns every task query returns: the task row plus its read-model fields.
pub(crate) const TASK_SELECT: &str = "SELECT t.*, s.name AS section_name, s.icon AS section_icon,
        (SELECT COUNT(*) FROM attachments a WHERE a.task_id = t.id) AS attachment_count
     FROM tasks t
     LEFT JOIN sections s ON s.id = t.section_id";

pub(crate) const TASK_ORDER: &str =
    "ORDER BY t.is_completed ASC, t.due_date ASC NULLS LAST, t.created_at DESC, t.id DESC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    #[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
    Sqlite,
    #[cfg_attr(not(feature = "postgres"), allow(dead_code))]
    Postgres,
}

impl Dialect {
    pub(crate) fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{n}"),
            Dialect::Postgres => format!("${n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Param {
    Int(i64),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

/// Task sets that are counted or listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    View(View),
    Overdue,
    RemindersDue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Predicate {
    pub sql: String,
    pub params: Vec<Param>,
}

/// Build the WHERE clause body for `scope`. Placeholders are numbered from
/// `first_param`.
pub(crate) fn predicate(scope: Scope, clock: &Clock, dialect: Dialect, first_param: usize) -> Predicate {
    let p = |offset: usize| dialect.placeholder(first_param + offset);
    let (sql, params) = match scope {
        Scope::View(View::Trash) => ("t.is_deleted".to_string(), vec![]),
        Scope::View(View::Today) => (
            format!("NOT t.is_deleted AND NOT t.is_completed AND t.due_date = {}", p(0)),
            vec![Param::Date(clock.today)],
        ),
        Scope::View(View::Upcoming) => (
            format!("NOT t.is_deleted AND NOT t.is_completed AND t.due_date > {}", p(0)),
            vec![Param::Date(clock.today)],
        ),
        Scope::View(View::Important) => (
            "NOT t.is_deleted AND NOT t.is_completed AND t.is_important".to_string(),
            vec![],
        ),
        Scope::View(View::All) => ("NOT t.is_deleted AND NOT t.is_completed".to_string(), vec![]),
        Scope::View(View::Logbox) => (
            format!("NOT t.is_deleted AND t.is_completed AND t.completed_at >= {}", p(0)),
            vec![Param::Timestamp(clock.logbox_cutoff())],
        ),
        Scope::View(View::Section(id)) => (
            format!("NOT t.is_deleted AND NOT t.is_completed AND t.section_id = {}", p(0)),
            vec![Param::Int(id)],
        ),
        Scope::Overdue => (
            format!("NOT t.is_deleted AND NOT t.is_completed AND t.due_date < {}", p(0)),
            vec![Param::Date(clock.today)],
        ),
        Scope::RemindersDue => (
            format!(
                "NOT t.is_deleted AND NOT t.is_completed AND t.reminder_type IS NOT NULL \
                 AND (t.last_reminded_on IS NULL OR t.last_reminded_on < {})",
                p(0)
            ),
            vec![Param::Date(clock.today)],
        ),
    };
    Predicate { sql, params }
}

/// Scopes behind each `TaskStats` field, in field order.
pub(crate) const STAT_SCOPES: [Scope; 7] = [
    Scope::View(View::Today),
    Scope::Overdue,
    Scope::View(View::Upcoming),
    Scope::View(View::Important),
    Scope::View(View::Trash),
    Scope::View(View::Logbox),
    Scope::RemindersDue,
];

pub(crate) fn stats_from_counts(counts: [i64; 7]) -> mytodo_core::stats::TaskStats {
    let [today, overdue, upcoming, important, trash, logbox, reminders] = counts;
    mytodo_core::stats::TaskStats {
        today,
        overdue,
        upcoming,
        important,
        trash,
        logbox,
        reminders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> Clock {
        Clock::fixed(
            NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
            Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn placeholders_follow_dialect() {
        let sqlite = predicate(Scope::View(View::Today), &clock(), Dialect::Sqlite, 1);
        assert!(sqlite.sql.ends_with("t.due_date = ?1"));
        let pg = predicate(Scope::View(View::Section(4)), &clock(), Dialect::Postgres, 3);
        assert!(pg.sql.ends_with("t.section_id = $3"));
        assert_eq!(pg.params, vec![Param::Int(4)]);
    }

    #[test]
    fn only_trash_admits_deleted_rows() {
        for view in View::NAMED {
            let pred = predicate(Scope::View(*view), &clock(), Dialect::Sqlite, 1);
            let excludes_deleted = pred.sql.starts_with("NOT t.is_deleted");
            assert_eq!(excludes_deleted, *view != View::Trash, "{view}");
        }
    }

    #[test]
    fn logbox_binds_six_month_cutoff() {
        let c = clock();
        let pred = predicate(Scope::View(View::Logbox), &c, Dialect::Postgres, 1);
        assert_eq!(pred.params, vec![Param::Timestamp(c.logbox_cutoff())]);
    }
}
