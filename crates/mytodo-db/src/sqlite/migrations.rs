use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .to_db()?;

    if current_version < 1 {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sections (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                icon        TEXT NOT NULL DEFAULT '📁',
                sort_order  INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                title            TEXT NOT NULL,
                description      TEXT,
                section_id       INTEGER REFERENCES sections(id) ON DELETE SET NULL,
                due_date         TEXT,
                is_important     INTEGER NOT NULL DEFAULT 0,
                is_completed     INTEGER NOT NULL DEFAULT 0,
                completed_at     TEXT,
                is_deleted       INTEGER NOT NULL DEFAULT 0,
                deleted_at       TEXT,
                reminder_type    TEXT CHECK(reminder_type IN ('daily', 'weekly', 'monthly', 'monthly_date')),
                reminder_day     INTEGER,
                last_reminded_on TEXT,
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_section   ON tasks(section_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_due       ON tasks(due_date);
            CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(is_completed, completed_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_deleted   ON tasks(is_deleted, deleted_at);

            CREATE TABLE IF NOT EXISTS attachments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id     INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                type        TEXT NOT NULL CHECK(type IN ('image', 'pdf', 'url')),
                name        TEXT NOT NULL,
                url         TEXT NOT NULL,
                store_key   TEXT,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_attachments_task ON attachments(task_id);

            INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
            ",
        )
        .to_db()?;
    }

    Ok(())
}
