use chrono::{DateTime, NaiveDate, Utc};

use mytodo_core::attachment::Attachment;
use mytodo_core::clock::Clock;
use mytodo_core::task::{CreateTask, ReminderType, Task, UpdateTask};
use mytodo_core::view::View;

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::filter::{self, Dialect, Param, Scope, TASK_ORDER, TASK_SELECT};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    section_id: Option<i64>,
    due_date: Option<NaiveDate>,
    is_important: bool,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    reminder_type: Option<String>,
    reminder_day: Option<i64>,
    last_reminded_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    section_name: Option<String>,
    section_icon: Option<String>,
    attachment_count: i64,
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Task {
            id: r.id,
            title: r.title,
            description: r.description,
            section_id: r.section_id,
            due_date: r.due_date,
            is_important: r.is_important,
            is_completed: r.is_completed,
            completed_at: r.completed_at,
            is_deleted: r.is_deleted,
            deleted_at: r.deleted_at,
            reminder_type: ReminderType::from_column(r.reminder_type.as_deref()),
            reminder_day: r.reminder_day,
            last_reminded_on: r.last_reminded_on,
            created_at: r.created_at,
            updated_at: r.updated_at,
            section_name: r.section_name,
            section_icon: r.section_icon,
            attachment_count: r.attachment_count,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_list_tasks(&self, view: &View, clock: &Clock) -> Result<Vec<Task>, DbError> {
        let pred = filter::predicate(Scope::View(*view), clock, Dialect::Postgres, 1);
        let sql = format!("{TASK_SELECT} WHERE {} {TASK_ORDER}", pred.sql);

        let mut query = sqlx::query_as::<_, TaskRow>(&sql);
        for p in &pred.params {
            query = match *p {
                Param::Int(v) => query.bind(v),
                Param::Date(d) => query.bind(d),
                Param::Timestamp(t) => query.bind(t),
            };
        }

        let rows = query.fetch_all(&self.pool).await.map_err(pg_err)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub(crate) async fn pg_get_task(&self, id: i64) -> Result<Task, DbError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{TASK_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("task {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tasks (title, description, section_id, due_date, is_important,
                                reminder_type, reminder_day, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.section_id)
        .bind(input.due_date)
        .bind(input.is_important)
        .bind(input.reminder_type.to_column())
        .bind(input.reminder_day)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        self.pg_get_task(id).await
    }

    pub(crate) async fn pg_update_task(&self, id: i64, update: &UpdateTask) -> Result<Task, DbError> {
        enum ParamValue {
            Str(String),
            OptStr(Option<String>),
            OptInt(Option<i64>),
            OptDate(Option<NaiveDate>),
            Bool(bool),
            Timestamp(DateTime<Utc>),
        }

        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut params: Vec<ParamValue> = vec![ParamValue::Timestamp(now)];

        if let Some(ref title) = update.title {
            params.push(ParamValue::Str(title.clone()));
            sets.push(format!("title = ${}", params.len()));
        }
        if let Some(ref description) = update.description {
            params.push(ParamValue::OptStr(description.clone()));
            sets.push(format!("description = ${}", params.len()));
        }
        if let Some(section_id) = update.section_id {
            params.push(ParamValue::OptInt(section_id));
            sets.push(format!("section_id = ${}", params.len()));
        }
        if let Some(due_date) = update.due_date {
            params.push(ParamValue::OptDate(due_date));
            sets.push(format!("due_date = ${}", params.len()));
        }
        if let Some(is_important) = update.is_important {
            params.push(ParamValue::Bool(is_important));
            sets.push(format!("is_important = ${}", params.len()));
        }
        if let Some(is_completed) = update.is_completed {
            params.push(ParamValue::Bool(is_completed));
            sets.push(format!("is_completed = ${}", params.len()));
            if is_completed {
                // Only the false -> true transition stamps a new time.
                sets.push("completed_at = CASE WHEN is_completed THEN completed_at ELSE $1 END".into());
            } else {
                sets.push("completed_at = NULL".into());
            }
        }
        if let Some(reminder_type) = update.reminder_type {
            params.push(ParamValue::OptStr(reminder_type.to_column().map(String::from)));
            sets.push(format!("reminder_type = ${}", params.len()));
        }
        if let Some(reminder_day) = update.reminder_day {
            params.push(ParamValue::OptInt(reminder_day));
            sets.push(format!("reminder_day = ${}", params.len()));
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ${}",
            sets.join(", "),
            params.len() + 1
        );

        let mut query = sqlx::query(&sql);
        for p in &params {
            query = match p {
                ParamValue::Str(s) => query.bind(s),
                ParamValue::OptStr(s) => query.bind(s),
                ParamValue::OptInt(i) => query.bind(i),
                ParamValue::OptDate(d) => query.bind(d),
                ParamValue::Bool(b) => query.bind(b),
                ParamValue::Timestamp(t) => query.bind(t),
            };
        }
        let result = query.bind(id).execute(&self.pool).await.map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        self.pg_get_task(id).await
    }

    pub(crate) async fn pg_soft_delete_task(&self, id: i64) -> Result<Task, DbError> {
        let result = sqlx::query(
            "UPDATE tasks SET is_deleted = TRUE, deleted_at = COALESCE(deleted_at, $1)
             WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        self.pg_get_task(id).await
    }

    pub(crate) async fn pg_restore_task(&self, id: i64) -> Result<Task, DbError> {
        let result =
            sqlx::query("UPDATE tasks SET is_deleted = FALSE, deleted_at = NULL WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        self.pg_get_task(id).await
    }

    pub(crate) async fn pg_delete_task(&self, id: i64) -> Result<Vec<Attachment>, DbError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        let attachments = super::attachments::attachments_for_task(&mut *tx, id).await?;
        sqlx::query("DELETE FROM attachments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        tx.commit().await.map_err(pg_err)?;
        Ok(attachments)
    }

    pub(crate) async fn pg_mark_task_reminded(&self, id: i64, today: NaiveDate) -> Result<Task, DbError> {
        let result = sqlx::query("UPDATE tasks SET last_reminded_on = $1 WHERE id = $2")
            .bind(today)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("task {id}")));
        }
        self.pg_get_task(id).await
    }
}
