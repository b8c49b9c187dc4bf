// Backend-agnostic integration tests for the Database trait.
//
// Each public async function accepts `&dyn Database` so that the same logic
// can be exercised against both the SQLite and Postgres backends.

use chrono::Duration;

use mytodo_core::attachment::{AttachmentKind, NewAttachment};
use mytodo_core::clock::Clock;
use mytodo_core::section::{CreateSection, UpdateSection};
use mytodo_core::task::{CreateTask, ReminderType, UpdateTask};
use mytodo_core::view::View;
use mytodo_db::{Database, DbError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_section(name: &str) -> CreateSection {
    CreateSection {
        name: name.to_string(),
        icon: None,
    }
}

async fn ids_in(db: &dyn Database, view: View, clock: &Clock) -> Vec<i64> {
    let mut ids: Vec<i64> = db
        .list_tasks(&view, clock)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    ids.sort_unstable();
    ids
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

pub async fn test_section_crud(db: &dyn Database) {
    let work = db.create_section(&make_section("Work")).await.unwrap();
    assert_eq!(work.icon, "📁");
    assert_eq!(work.sort_order, 1);
    assert_eq!(work.task_count, 0);

    let home = db
        .create_section(&CreateSection {
            name: "Home".into(),
            icon: Some("🏠".into()),
        })
        .await
        .unwrap();
    assert_eq!(home.icon, "🏠");
    assert_eq!(home.sort_order, 2);

    let renamed = db
        .update_section(
            work.id,
            &UpdateSection {
                name: Some("Office".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Office");
    assert_eq!(renamed.icon, "📁");
    assert_eq!(renamed.sort_order, 1);

    let err = db
        .update_section(work.id, &UpdateSection::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)));

    let err = db
        .update_section(
            9999,
            &UpdateSection {
                icon: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));

    db.delete_section(home.id).await.unwrap();
    let sections = db.list_sections().await.unwrap();
    assert_eq!(sections.len(), 1);
    assert!(matches!(
        db.get_section(home.id).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(
        db.delete_section(home.id).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_section_reorder(db: &dyn Database) {
    let one = db.create_section(&make_section("one")).await.unwrap();
    let two = db.create_section(&make_section("two")).await.unwrap();
    let three = db.create_section(&make_section("three")).await.unwrap();

    let sections = db
        .reorder_sections(&[three.id, one.id, two.id])
        .await
        .unwrap();
    let order: Vec<(i64, i64)> = sections.iter().map(|s| (s.id, s.sort_order)).collect();
    assert_eq!(order, vec![(three.id, 1), (one.id, 2), (two.id, 3)]);

    // Not a permutation: rejected, nothing changes.
    let err = db.reorder_sections(&[one.id, two.id]).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)));
    let err = db
        .reorder_sections(&[one.id, two.id, three.id, 9999])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)));

    let order: Vec<i64> = db.list_sections().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(order, vec![three.id, one.id, two.id]);
}

pub async fn test_section_delete_detaches_tasks(db: &dyn Database) {
    let section = db.create_section(&make_section("Errands")).await.unwrap();
    let mut ids = Vec::new();
    for title in ["milk", "bread", "post office"] {
        let task = db
            .create_task(&CreateTask {
                section_id: Some(section.id),
                ..CreateTask::new(title)
            })
            .await
            .unwrap();
        assert_eq!(task.section_name.as_deref(), Some("Errands"));
        ids.push(task.id);
    }
    assert_eq!(db.get_section(section.id).await.unwrap().task_count, 3);

    db.delete_section(section.id).await.unwrap();

    for id in ids {
        let task = db.get_task(id).await.unwrap();
        assert_eq!(task.section_id, None);
        assert_eq!(task.section_name, None);
        assert!(!task.is_deleted);
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub async fn test_task_crud(db: &dyn Database) {
    let clock = Clock::local();
    let section = db.create_section(&make_section("Work")).await.unwrap();
    let task = db
        .create_task(&CreateTask {
            title: "Write report".into(),
            description: Some("quarterly".into()),
            section_id: Some(section.id),
            due_date: Some(clock.today),
            is_important: true,
            reminder_type: ReminderType::Weekly,
            reminder_day: Some(1),
        })
        .await
        .unwrap();
    assert!(task.id > 0);
    assert_eq!(task.title, "Write report");
    assert_eq!(task.section_icon.as_deref(), Some("📁"));
    assert_eq!(task.reminder_type, ReminderType::Weekly);
    assert_eq!(task.reminder_day, Some(1));
    assert!(!task.is_completed && !task.is_deleted);
    assert_eq!(task.attachment_count, 0);

    let fetched = db.get_task(task.id).await.unwrap();
    assert_eq!(fetched, task);

    // Partial update: only title changes.
    let updated = db
        .update_task(
            task.id,
            &UpdateTask {
                title: Some("Write final report".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Write final report");
    assert_eq!(updated.description.as_deref(), Some("quarterly"));
    assert_eq!(updated.due_date, Some(clock.today));
    assert!(updated.updated_at >= task.updated_at);

    // Explicit nulls clear nullable fields.
    let cleared = db
        .update_task(
            task.id,
            &UpdateTask {
                description: Some(None),
                section_id: Some(None),
                due_date: Some(None),
                reminder_type: Some(ReminderType::None),
                reminder_day: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.section_id, None);
    assert_eq!(cleared.due_date, None);
    assert_eq!(cleared.reminder_type, ReminderType::None);
    assert_eq!(cleared.reminder_day, None);

    assert!(matches!(
        db.update_task(9999, &UpdateTask::completed(true)).await,
        Err(DbError::NotFound(_))
    ));
    assert!(matches!(db.get_task(9999).await, Err(DbError::NotFound(_))));
}

pub async fn test_completion_stamps(db: &dyn Database) {
    let task = db.create_task(&CreateTask::new("stamp me")).await.unwrap();
    assert_eq!(task.completed_at, None);

    let done = db.update_task(task.id, &UpdateTask::completed(true)).await.unwrap();
    assert!(done.is_completed);
    let stamped = done.completed_at.expect("completed_at set on completion");

    // Completing again keeps the first stamp.
    let again = db.update_task(task.id, &UpdateTask::completed(true)).await.unwrap();
    assert_eq!(again.completed_at, Some(stamped));

    let reopened = db.update_task(task.id, &UpdateTask::completed(false)).await.unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.completed_at, None);
}

pub async fn test_soft_delete_and_restore(db: &dyn Database) {
    let clock = Clock::local();
    let section = db.create_section(&make_section("Home")).await.unwrap();
    let task = db
        .create_task(&CreateTask {
            section_id: Some(section.id),
            due_date: Some(clock.today),
            is_important: true,
            ..CreateTask::new("water plants")
        })
        .await
        .unwrap();

    let views = [
        View::Today,
        View::Upcoming,
        View::Important,
        View::All,
        View::Logbox,
        View::Trash,
        View::Section(section.id),
    ];
    let mut before = Vec::new();
    for view in views {
        before.push(ids_in(db, view, &clock).await.contains(&task.id));
    }

    let trashed = db.soft_delete_task(task.id).await.unwrap();
    assert!(trashed.is_deleted);
    assert!(trashed.deleted_at.is_some());
    for view in views {
        let present = ids_in(db, view, &clock).await.contains(&task.id);
        assert_eq!(present, view == View::Trash, "{view} while trashed");
    }

    let restored = db.restore_task(task.id).await.unwrap();
    assert!(!restored.is_deleted);
    assert_eq!(restored.deleted_at, None);
    assert_eq!(restored.is_important, task.is_important);
    assert_eq!(restored.due_date, task.due_date);
    for (view, was_present) in views.into_iter().zip(before) {
        let present = ids_in(db, view, &clock).await.contains(&task.id);
        assert_eq!(present, was_present, "{view} after restore");
    }

    assert!(matches!(
        db.soft_delete_task(9999).await,
        Err(DbError::NotFound(_))
    ));
}

pub async fn test_views(db: &dyn Database) {
    let clock = Clock::local();
    let yesterday = clock.today - Duration::days(1);
    let tomorrow = clock.today + Duration::days(1);
    let section = db.create_section(&make_section("Project")).await.unwrap();

    let undated = db.create_task(&CreateTask::new("undated")).await.unwrap();
    let due_today = db
        .create_task(&CreateTask {
            due_date: Some(clock.today),
            ..CreateTask::new("today")
        })
        .await
        .unwrap();
    let overdue = db
        .create_task(&CreateTask {
            due_date: Some(yesterday),
            ..CreateTask::new("overdue")
        })
        .await
        .unwrap();
    let upcoming = db
        .create_task(&CreateTask {
            due_date: Some(tomorrow),
            is_important: true,
            ..CreateTask::new("upcoming")
        })
        .await
        .unwrap();
    let filed = db
        .create_task(&CreateTask {
            section_id: Some(section.id),
            ..CreateTask::new("filed")
        })
        .await
        .unwrap();
    let done = db
        .create_task(&CreateTask {
            due_date: Some(clock.today),
            is_important: true,
            section_id: Some(section.id),
            ..CreateTask::new("done")
        })
        .await
        .unwrap();
    db.update_task(done.id, &UpdateTask::completed(true)).await.unwrap();

    assert_eq!(ids_in(db, View::Today, &clock).await, vec![due_today.id]);
    assert_eq!(ids_in(db, View::Upcoming, &clock).await, vec![upcoming.id]);
    assert_eq!(ids_in(db, View::Important, &clock).await, vec![upcoming.id]);
    assert_eq!(
        ids_in(db, View::All, &clock).await,
        vec![undated.id, due_today.id, overdue.id, upcoming.id, filed.id]
    );
    assert_eq!(ids_in(db, View::Logbox, &clock).await, vec![done.id]);
    assert_eq!(ids_in(db, View::Section(section.id), &clock).await, vec![filed.id]);
    assert!(ids_in(db, View::Trash, &clock).await.is_empty());

    // Every listed task satisfies the in-memory predicate too.
    for view in View::NAMED.iter().copied().chain([View::Section(section.id)]) {
        for task in db.list_tasks(&view, &clock).await.unwrap() {
            assert!(view.matches(&task, &clock), "{view} listed task {}", task.id);
        }
    }
}

pub async fn test_listing_order(db: &dyn Database) {
    let clock = Clock::local();
    let undated_old = db.create_task(&CreateTask::new("undated old")).await.unwrap();
    let late = db
        .create_task(&CreateTask {
            due_date: Some(clock.today + Duration::days(5)),
            ..CreateTask::new("late")
        })
        .await
        .unwrap();
    let early = db
        .create_task(&CreateTask {
            due_date: Some(clock.today + Duration::days(1)),
            ..CreateTask::new("early")
        })
        .await
        .unwrap();
    let undated_new = db.create_task(&CreateTask::new("undated new")).await.unwrap();

    let listed: Vec<i64> = db
        .list_tasks(&View::All, &clock)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(listed, vec![early.id, late.id, undated_new.id, undated_old.id]);
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

pub async fn test_attachments(db: &dyn Database) {
    let task = db.create_task(&CreateTask::new("with files")).await.unwrap();
    let link = db
        .create_attachment(&NewAttachment::link(task.id, "https://example.com/spec"))
        .await
        .unwrap();
    assert_eq!(link.kind, AttachmentKind::Url);
    assert_eq!(link.name, "https://example.com/spec");
    assert_eq!(link.store_key, None);

    let key = format!("attachments/{}/1700000000000-scan.pdf", task.id);
    let file = db
        .create_attachment(&NewAttachment::file(task.id, AttachmentKind::Pdf, "scan.pdf", &key))
        .await
        .unwrap();
    assert_eq!(file.url, format!("/api/files/{key}"));

    let listed = db.list_attachments(task.id).await.unwrap();
    assert_eq!(
        listed.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![file.id, link.id]
    );
    assert_eq!(db.get_task(task.id).await.unwrap().attachment_count, 2);
    assert_eq!(db.get_attachment(file.id).await.unwrap(), file);

    let removed = db.delete_attachment(link.id).await.unwrap();
    assert_eq!(removed.id, link.id);
    assert!(matches!(
        db.get_attachment(link.id).await,
        Err(DbError::NotFound(_))
    ));

    // Attachments on a missing task violate the foreign key.
    let err = db
        .create_attachment(&NewAttachment::link(9999, "https://example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput(_)));
}

pub async fn test_hard_delete_returns_attachments(db: &dyn Database) {
    let task = db.create_task(&CreateTask::new("doomed")).await.unwrap();
    let key = format!("attachments/{}/1-photo.png", task.id);
    db.create_attachment(&NewAttachment::file(task.id, AttachmentKind::Image, "photo.png", &key))
        .await
        .unwrap();
    db.create_attachment(&NewAttachment::link(task.id, "https://example.com"))
        .await
        .unwrap();

    let removed = db.delete_task(task.id).await.unwrap();
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().any(|a| a.store_key.as_deref() == Some(key.as_str())));

    assert!(matches!(db.get_task(task.id).await, Err(DbError::NotFound(_))));
    assert!(db.list_attachments(task.id).await.unwrap().is_empty());
    assert!(matches!(db.delete_task(task.id).await, Err(DbError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

pub async fn test_stats(db: &dyn Database) {
    let clock = Clock::local();
    let yesterday = clock.today - Duration::days(1);
    let tomorrow = clock.today + Duration::days(1);

    db.create_task(&CreateTask {
        due_date: Some(clock.today),
        ..CreateTask::new("today")
    })
    .await
    .unwrap();
    db.create_task(&CreateTask {
        due_date: Some(yesterday),
        is_important: true,
        ..CreateTask::new("overdue")
    })
    .await
    .unwrap();
    db.create_task(&CreateTask {
        due_date: Some(tomorrow),
        reminder_type: ReminderType::Daily,
        ..CreateTask::new("upcoming")
    })
    .await
    .unwrap();
    let done = db.create_task(&CreateTask::new("done")).await.unwrap();
    db.update_task(done.id, &UpdateTask::completed(true)).await.unwrap();
    let trashed = db
        .create_task(&CreateTask {
            due_date: Some(clock.today),
            ..CreateTask::new("trashed")
        })
        .await
        .unwrap();
    db.soft_delete_task(trashed.id).await.unwrap();

    let stats = db.task_stats(&clock).await.unwrap();
    assert_eq!(stats.today, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.upcoming, 1);
    assert_eq!(stats.important, 1);
    assert_eq!(stats.trash, 1);
    assert_eq!(stats.logbox, 1);
    assert_eq!(stats.reminders, 1);

    // Stats agree with the view listings.
    for view in View::NAMED {
        if let Some(count) = stats.count_for(view) {
            let listed = db.list_tasks(view, &clock).await.unwrap().len() as i64;
            assert_eq!(count, listed, "{view}");
        }
    }
}

pub async fn test_reminders_due(db: &dyn Database) {
    let clock = Clock::local();
    let task = db
        .create_task(&CreateTask {
            reminder_type: ReminderType::MonthlyDate,
            reminder_day: Some(15),
            ..CreateTask::new("pay rent")
        })
        .await
        .unwrap();
    db.create_task(&CreateTask::new("no reminder")).await.unwrap();
    assert_eq!(db.task_stats(&clock).await.unwrap().reminders, 1);

    let reminded = db.mark_task_reminded(task.id, clock.today).await.unwrap();
    assert_eq!(reminded.last_reminded_on, Some(clock.today));
    assert!(!reminded.reminder_due(clock.today));
    assert_eq!(db.task_stats(&clock).await.unwrap().reminders, 0);

    // Tomorrow it is due again.
    let tomorrow = Clock::fixed(clock.today + Duration::days(1), clock.now + Duration::days(1));
    assert_eq!(db.task_stats(&tomorrow).await.unwrap().reminders, 1);

    assert!(matches!(
        db.mark_task_reminded(9999, clock.today).await,
        Err(DbError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

pub async fn test_purge_expired(db: &dyn Database) {
    let now = Clock::local();
    let trashed = db.create_task(&CreateTask::new("trashed")).await.unwrap();
    let key = format!("attachments/{}/1-old.png", trashed.id);
    db.create_attachment(&NewAttachment::file(trashed.id, AttachmentKind::Image, "old.png", &key))
        .await
        .unwrap();
    db.soft_delete_task(trashed.id).await.unwrap();

    let completed = db.create_task(&CreateTask::new("completed")).await.unwrap();
    db.update_task(completed.id, &UpdateTask::completed(true)).await.unwrap();
    let active = db.create_task(&CreateTask::new("active")).await.unwrap();

    // Nothing is old enough yet.
    let outcome = db.purge_expired(&now).await.unwrap();
    assert_eq!(outcome.report.total(), 0);

    // A month on, only the trash expires.
    let month_later = Clock::at(now.now + Duration::days(31));
    let outcome = db.purge_expired(&month_later).await.unwrap();
    assert_eq!(outcome.report.trashed_purged, 1);
    assert_eq!(outcome.report.completed_purged, 0);
    assert_eq!(outcome.store_keys, vec![key]);
    assert!(matches!(db.get_task(trashed.id).await, Err(DbError::NotFound(_))));

    // Half a year on, the completed task expires too.
    let half_year_later = Clock::at(now.now + Duration::days(190));
    let outcome = db.purge_expired(&half_year_later).await.unwrap();
    assert_eq!(outcome.report.trashed_purged, 0);
    assert_eq!(outcome.report.completed_purged, 1);

    // Second run is a no-op.
    let outcome = db.purge_expired(&half_year_later).await.unwrap();
    assert_eq!(outcome.report.total(), 0);
    assert!(outcome.store_keys.is_empty());

    assert!(db.get_task(active.id).await.is_ok());
}
