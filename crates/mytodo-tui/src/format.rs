use chrono::NaiveDate;
use mytodo_core::task::{ReminderType, Task};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// How a due date relates to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBadge {
    Overdue,
    Today,
    Upcoming,
}

pub fn due_badge(due: NaiveDate, today: NaiveDate) -> DueBadge {
    if due < today {
        DueBadge::Overdue
    } else if due == today {
        DueBadge::Today
    } else {
        DueBadge::Upcoming
    }
}

/// Relative label for dates near today, `YY/MM/DD` beyond a week out.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    let diff = (due - today).num_days();
    match diff {
        0 => "Today".into(),
        1 => "Tomorrow".into(),
        -1 => "Yesterday".into(),
        d if d < -1 => format!("{}d ago", -d),
        d if d < 7 => format!("in {d}d"),
        _ => due.format("%y/%m/%d").to_string(),
    }
}

/// Short reminder description, empty when no reminder is set.
pub fn reminder_label(kind: ReminderType, day: Option<i64>) -> String {
    match kind {
        ReminderType::None => String::new(),
        ReminderType::Daily => "Daily".into(),
        ReminderType::Weekly => match day.and_then(|d| usize::try_from(d).ok()) {
            Some(d) if d < WEEKDAYS.len() => format!("Weekly on {}", WEEKDAYS[d]),
            _ => "Weekly".into(),
        },
        ReminderType::Monthly => "Monthly".into(),
        ReminderType::MonthlyDate => match day {
            Some(d) => format!("Monthly on the {}", ordinal(d)),
            None => "Monthly".into(),
        },
    }
}

fn ordinal(n: i64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// One-line summary used by the task list.
pub fn task_meta(task: &Task, today: NaiveDate) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(due) = task.due_date {
        parts.push(due_label(due, today));
    }
    if let (Some(icon), Some(name)) = (&task.section_icon, &task.section_name) {
        parts.push(format!("{icon} {name}"));
    }
    let reminder = reminder_label(task.reminder_type, task.reminder_day);
    if !reminder.is_empty() {
        parts.push(reminder);
    }
    if task.attachment_count > 0 {
        parts.push(format!("📎{}", task.attachment_count));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn labels_near_today_are_relative() {
        let today = d(2026, 3, 10);
        assert_eq!(due_label(today, today), "Today");
        assert_eq!(due_label(d(2026, 3, 11), today), "Tomorrow");
        assert_eq!(due_label(d(2026, 3, 9), today), "Yesterday");
        assert_eq!(due_label(d(2026, 3, 5), today), "5d ago");
        assert_eq!(due_label(d(2026, 3, 16), today), "in 6d");
    }

    #[test]
    fn labels_a_week_out_are_absolute() {
        let today = d(2026, 3, 10);
        assert_eq!(due_label(d(2026, 3, 17), today), "26/03/17");
        assert_eq!(due_label(d(2027, 1, 2), today), "27/01/02");
    }

    #[test]
    fn badge_buckets() {
        let today = d(2026, 3, 10);
        assert_eq!(due_badge(d(2026, 3, 1), today), DueBadge::Overdue);
        assert_eq!(due_badge(today, today), DueBadge::Today);
        assert_eq!(due_badge(d(2026, 4, 1), today), DueBadge::Upcoming);
    }

    #[test]
    fn reminder_labels() {
        assert_eq!(reminder_label(ReminderType::None, Some(3)), "");
        assert_eq!(reminder_label(ReminderType::Daily, None), "Daily");
        assert_eq!(reminder_label(ReminderType::Weekly, Some(0)), "Weekly on Sun");
        assert_eq!(reminder_label(ReminderType::Weekly, Some(9)), "Weekly");
        assert_eq!(reminder_label(ReminderType::Monthly, None), "Monthly");
        assert_eq!(
            reminder_label(ReminderType::MonthlyDate, Some(1)),
            "Monthly on the 1st"
        );
        assert_eq!(
            reminder_label(ReminderType::MonthlyDate, Some(12)),
            "Monthly on the 12th"
        );
        assert_eq!(
            reminder_label(ReminderType::MonthlyDate, Some(23)),
            "Monthly on the 23rd"
        );
    }
}
