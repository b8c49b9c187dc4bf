use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, Row};

use mytodo_core::attachment::Attachment;
use mytodo_core::clock::Clock;
use mytodo_core::task::{CreateTask, ReminderType, Task, UpdateTask};
use mytodo_core::view::View;

use super::super::{not_found_or, SqliteDatabase, SqliteResultExt};
use super::attachments::attachments_for_task;
use crate::filter::{self, Dialect, Scope, TASK_ORDER, TASK_SELECT};
use crate::DbError;

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let reminder_type: Option<String> = row.get("reminder_type")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        section_id: row.get("section_id")?,
        due_date: row.get("due_date")?,
        is_important: row.get("is_important")?,
        is_completed: row.get("is_completed")?,
        completed_at: row.get("completed_at")?,
        is_deleted: row.get("is_deleted")?,
        deleted_at: row.get("deleted_at")?,
        reminder_type: ReminderType::from_column(reminder_type.as_deref()),
        reminder_day: row.get("reminder_day")?,
        last_reminded_on: row.get("last_reminded_on")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        section_name: row.get("section_name")?,
        section_icon: row.get("section_icon")?,
        attachment_count: row.get("attachment_count")?,
    })
}

pub(crate) fn fetch_task(conn: &Connection, id: i64) -> Result<Task, DbError> {
    conn.query_row(
        &format!("{TASK_SELECT} WHERE t.id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(not_found_or(format!("task {id}")))
}

/// Execute a single-row UPDATE on `tasks` and return the fresh row.
fn update_one(conn: &Connection, id: i64, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Task, DbError> {
    let changed = conn.execute(sql, params).to_db()?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("task {id}")));
    }
    fetch_task(conn, id)
}

impl SqliteDatabase {
    pub fn list_tasks_sync(&self, view: &View, clock: &Clock) -> Result<Vec<Task>, DbError> {
        self.with_conn(|conn| {
            let pred = filter::predicate(Scope::View(*view), clock, Dialect::Sqlite, 1);
            let sql = format!("{TASK_SELECT} WHERE {} {TASK_ORDER}", pred.sql);
            let mut stmt = conn.prepare(&sql).to_db()?;
            let tasks = stmt
                .query_map(params_from_iter(pred.params.iter()), row_to_task)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(tasks)
        })
    }

    pub fn get_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| fetch_task(conn, id))
    }

    pub fn create_task_sync(&self, input: &CreateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO tasks (title, description, section_id, due_date, is_important,
                                    reminder_type, reminder_day, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    input.title,
                    input.description,
                    input.section_id,
                    input.due_date,
                    input.is_important,
                    input.reminder_type.to_column(),
                    input.reminder_day,
                    now,
                    now,
                ],
            )
            .to_db()?;
            fetch_task(conn, conn.last_insert_rowid())
        })
    }

    pub fn update_task_sync(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            let now = Utc::now();
            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now)];

            if let Some(ref title) = update.title {
                param_values.push(Box::new(title.clone()));
                sets.push(format!("title = ?{}", param_values.len()));
            }
            if let Some(ref description) = update.description {
                param_values.push(Box::new(description.clone()));
                sets.push(format!("description = ?{}", param_values.len()));
            }
            if let Some(section_id) = update.section_id {
                param_values.push(Box::new(section_id));
                sets.push(format!("section_id = ?{}", param_values.len()));
            }
            if let Some(due_date) = update.due_date {
                param_values.push(Box::new(due_date));
                sets.push(format!("due_date = ?{}", param_values.len()));
            }
            if let Some(is_important) = update.is_important {
                param_values.push(Box::new(is_important));
                sets.push(format!("is_important = ?{}", param_values.len()));
            }
            if let Some(is_completed) = update.is_completed {
                param_values.push(Box::new(is_completed));
                sets.push(format!("is_completed = ?{}", param_values.len()));
                if is_completed {
                    // Only the false -> true transition stamps a new time.
                    sets.push(
                        "completed_at = CASE WHEN is_completed THEN completed_at ELSE ?1 END"
                            .to_string(),
                    );
                } else {
                    sets.push("completed_at = NULL".to_string());
                }
            }
            if let Some(reminder_type) = update.reminder_type {
                param_values.push(Box::new(reminder_type.to_column()));
                sets.push(format!("reminder_type = ?{}", param_values.len()));
            }
            if let Some(reminder_day) = update.reminder_day {
                param_values.push(Box::new(reminder_day));
                sets.push(format!("reminder_day = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id));
            let sql = format!(
                "UPDATE tasks SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();
            update_one(conn, id, &sql, &params)
        })
    }

    pub fn soft_delete_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            update_one(
                conn,
                id,
                "UPDATE tasks SET is_deleted = 1, deleted_at = COALESCE(deleted_at, ?1)
                 WHERE id = ?2",
                &[&Utc::now(), &id],
            )
        })
    }

    pub fn restore_task_sync(&self, id: i64) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            update_one(
                conn,
                id,
                "UPDATE tasks SET is_deleted = 0, deleted_at = NULL WHERE id = ?1",
                &[&id],
            )
        })
    }

    pub fn delete_task_sync(&self, id: i64) -> Result<Vec<Attachment>, DbError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().to_db()?;
            let attachments = attachments_for_task(&tx, id)?;
            tx.execute("DELETE FROM attachments WHERE task_id = ?1", params![id])
                .to_db()?;
            let changed = tx
                .execute("DELETE FROM tasks WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("task {id}")));
            }
            tx.commit().to_db()?;
            Ok(attachments)
        })
    }

    pub fn mark_task_reminded_sync(&self, id: i64, today: NaiveDate) -> Result<Task, DbError> {
        self.with_conn(|conn| {
            update_one(
                conn,
                id,
                "UPDATE tasks SET last_reminded_on = ?1 WHERE id = ?2",
                &[&today, &id],
            )
        })
    }
}
