use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use mytodo_core::attachment::{Attachment, AttachmentKind, NewAttachment};

use super::super::{not_found_or, SqliteDatabase, SqliteResultExt};
use crate::DbError;

fn row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    let kind_idx = row.as_ref().column_index("type")?;
    let raw: String = row.get(kind_idx)?;
    let kind = AttachmentKind::parse_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            kind_idx,
            Type::Text,
            format!("unknown attachment type {raw:?}").into(),
        )
    })?;
    Ok(Attachment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        kind,
        name: row.get("name")?,
        url: row.get("url")?,
        store_key: row.get("store_key")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn attachments_for_task(conn: &Connection, task_id: i64) -> Result<Vec<Attachment>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT * FROM attachments WHERE task_id = ?1
             ORDER BY created_at DESC, id DESC",
        )
        .to_db()?;
    let attachments = stmt
        .query_map(params![task_id], row_to_attachment)
        .to_db()?
        .collect::<Result<Vec<_>, _>>()
        .to_db()?;
    Ok(attachments)
}

fn fetch_attachment(conn: &Connection, id: i64) -> Result<Attachment, DbError> {
    conn.query_row(
        "SELECT * FROM attachments WHERE id = ?1",
        params![id],
        row_to_attachment,
    )
    .map_err(not_found_or(format!("attachment {id}")))
}

impl SqliteDatabase {
    pub fn create_attachment_sync(&self, input: &NewAttachment) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO attachments (task_id, type, name, url, store_key, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.task_id,
                    input.kind.as_str(),
                    input.name,
                    input.url,
                    input.store_key,
                    Utc::now(),
                ],
            )
            .to_db()?;
            fetch_attachment(conn, conn.last_insert_rowid())
        })
    }

    pub fn list_attachments_sync(&self, task_id: i64) -> Result<Vec<Attachment>, DbError> {
        self.with_conn(|conn| attachments_for_task(conn, task_id))
    }

    pub fn get_attachment_sync(&self, id: i64) -> Result<Attachment, DbError> {
        self.with_conn(|conn| fetch_attachment(conn, id))
    }

    pub fn delete_attachment_sync(&self, id: i64) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            let attachment = fetch_attachment(conn, id)?;
            conn.execute("DELETE FROM attachments WHERE id = ?1", params![id])
                .to_db()?;
            Ok(attachment)
        })
    }
}
