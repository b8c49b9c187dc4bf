use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use mytodo_core::attachment::{Attachment, AttachmentKind, NewAttachment};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: i64,
    task_id: i64,
    #[sqlx(rename = "type")]
    kind: String,
    name: String,
    url: String,
    store_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttachmentRow> for Attachment {
    type Error = DbError;

    fn try_from(r: AttachmentRow) -> Result<Self, DbError> {
        let kind = AttachmentKind::parse_str(&r.kind).ok_or_else(|| {
            DbError::Internal(format!("attachment {} has unknown type {:?}", r.id, r.kind))
        })?;
        Ok(Attachment {
            id: r.id,
            task_id: r.task_id,
            kind,
            name: r.name,
            url: r.url,
            store_key: r.store_key,
            created_at: r.created_at,
        })
    }
}

pub(crate) async fn attachments_for_task(
    conn: &mut PgConnection,
    task_id: i64,
) -> Result<Vec<Attachment>, DbError> {
    let rows = sqlx::query_as::<_, AttachmentRow>(
        "SELECT * FROM attachments WHERE task_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(task_id)
    .fetch_all(conn)
    .await
    .map_err(pg_err)?;

    rows.into_iter().map(Attachment::try_from).collect()
}

impl PostgresDatabase {
    pub(crate) async fn pg_create_attachment(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "INSERT INTO attachments (task_id, type, name, url, store_key, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(input.task_id)
        .bind(input.kind.as_str())
        .bind(&input.name)
        .bind(&input.url)
        .bind(&input.store_key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        row.try_into()
    }

    pub(crate) async fn pg_list_attachments(&self, task_id: i64) -> Result<Vec<Attachment>, DbError> {
        let mut conn = self.pool.acquire().await.map_err(pg_err)?;
        attachments_for_task(&mut conn, task_id).await
    }

    pub(crate) async fn pg_get_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>("SELECT * FROM attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        row.try_into()
    }

    pub(crate) async fn pg_delete_attachment(&self, id: i64) -> Result<Attachment, DbError> {
        let row = sqlx::query_as::<_, AttachmentRow>("DELETE FROM attachments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("attachment {id}")))?;

        row.try_into()
    }
}
