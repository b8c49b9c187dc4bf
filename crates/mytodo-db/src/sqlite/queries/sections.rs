use chrono::Utc;
use rusqlite::{params, Connection, Row};

use mytodo_core::section::{CreateSection, Section, UpdateSection};

use super::super::{not_found_or, SqliteDatabase, SqliteResultExt};
use crate::DbError;

const SECTION_SELECT: &str = "SELECT s.id, s.name, s.icon, s.sort_order,
        (SELECT COUNT(*) FROM tasks t
          WHERE t.section_id = s.id AND NOT t.is_deleted AND NOT t.is_completed) AS task_count
     FROM sections s";

fn row_to_section(row: &Row) -> rusqlite::Result<Section> {
    Ok(Section {
        id: row.get("id")?,
        name: row.get("name")?,
        icon: row.get("icon")?,
        sort_order: row.get("sort_order")?,
        task_count: row.get("task_count")?,
    })
}

pub(crate) fn fetch_section(conn: &Connection, id: i64) -> Result<Section, DbError> {
    conn.query_row(
        &format!("{SECTION_SELECT} WHERE s.id = ?1"),
        params![id],
        row_to_section,
    )
    .map_err(not_found_or(format!("section {id}")))
}

fn fetch_sections(conn: &Connection) -> Result<Vec<Section>, DbError> {
    let mut stmt = conn
        .prepare(&format!("{SECTION_SELECT} ORDER BY s.sort_order ASC, s.id ASC"))
        .to_db()?;
    let sections = stmt
        .query_map([], row_to_section)
        .to_db()?
        .collect::<Result<Vec<_>, _>>()
        .to_db()?;
    Ok(sections)
}

impl SqliteDatabase {
    pub fn list_sections_sync(&self) -> Result<Vec<Section>, DbError> {
        self.with_conn(fetch_sections)
    }

    pub fn get_section_sync(&self, id: i64) -> Result<Section, DbError> {
        self.with_conn(|conn| fetch_section(conn, id))
    }

    pub fn create_section_sync(&self, input: &CreateSection) -> Result<Section, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sections (name, icon, sort_order, created_at)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM sections), ?3)",
                params![input.name, input.icon_or_default(), Utc::now()],
            )
            .to_db()?;
            fetch_section(conn, conn.last_insert_rowid())
        })
    }

    pub fn update_section_sync(&self, id: i64, update: &UpdateSection) -> Result<Section, DbError> {
        if update.is_empty() {
            return Err(DbError::InvalidInput("no fields to update".into()));
        }
        self.with_conn(|conn| {
            let mut sets: Vec<String> = Vec::new();
            let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(ref name) = update.name {
                param_values.push(Box::new(name.clone()));
                sets.push(format!("name = ?{}", param_values.len()));
            }
            if let Some(ref icon) = update.icon {
                param_values.push(Box::new(icon.clone()));
                sets.push(format!("icon = ?{}", param_values.len()));
            }
            if let Some(sort_order) = update.sort_order {
                param_values.push(Box::new(sort_order));
                sets.push(format!("sort_order = ?{}", param_values.len()));
            }

            param_values.push(Box::new(id));
            let sql = format!(
                "UPDATE sections SET {} WHERE id = ?{}",
                sets.join(", "),
                param_values.len()
            );
            let params: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();
            let changed = conn.execute(&sql, params.as_slice()).to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("section {id}")));
            }
            fetch_section(conn, id)
        })
    }

    pub fn reorder_sections_sync(&self, ids: &[i64]) -> Result<Vec<Section>, DbError> {
        self.with_conn(|conn| {
            let mut existing: Vec<i64> = conn
                .prepare("SELECT id FROM sections")
                .to_db()?
                .query_map([], |row| row.get(0))
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            existing.sort_unstable();
            let mut requested = ids.to_vec();
            requested.sort_unstable();
            if existing != requested {
                return Err(DbError::InvalidInput(
                    "sectionIds must list every section exactly once".into(),
                ));
            }

            let tx = conn.unchecked_transaction().to_db()?;
            for (index, id) in ids.iter().enumerate() {
                tx.execute(
                    "UPDATE sections SET sort_order = ?1 WHERE id = ?2",
                    params![index as i64 + 1, id],
                )
                .to_db()?;
            }
            tx.commit().to_db()?;
            fetch_sections(conn)
        })
    }

    pub fn delete_section_sync(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().to_db()?;
            tx.execute(
                "UPDATE tasks SET section_id = NULL WHERE section_id = ?1",
                params![id],
            )
            .to_db()?;
            let changed = tx
                .execute("DELETE FROM sections WHERE id = ?1", params![id])
                .to_db()?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("section {id}")));
            }
            tx.commit().to_db()
        })
    }
}

#[cfg(test)]
mod tests {
    use mytodo_core::task::CreateTask;

    use super::*;

    fn section(name: &str) -> CreateSection {
        CreateSection {
            name: name.into(),
            icon: None,
        }
    }

    #[test]
    fn sections_append_in_creation_order() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let a = db.create_section_sync(&section("Work")).unwrap();
        let b = db.create_section_sync(&section("Home")).unwrap();
        assert_eq!((a.sort_order, b.sort_order), (1, 2));
        assert_eq!(a.icon, "📁");
    }

    #[test]
    fn task_count_ignores_completed_and_trashed() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let s = db.create_section_sync(&section("Work")).unwrap();
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            let task = db
                .create_task_sync(&CreateTask {
                    section_id: Some(s.id),
                    ..CreateTask::new(title)
                })
                .unwrap();
            ids.push(task.id);
        }
        db.update_task_sync(ids[0], &mytodo_core::task::UpdateTask::completed(true))
            .unwrap();
        db.soft_delete_task_sync(ids[1]).unwrap();

        assert_eq!(db.get_section_sync(s.id).unwrap().task_count, 1);
    }

    #[test]
    fn failed_reorder_leaves_order_untouched() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let a = db.create_section_sync(&section("a")).unwrap();
        let b = db.create_section_sync(&section("b")).unwrap();

        let err = db.reorder_sections_sync(&[b.id]).unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
        let err = db.reorder_sections_sync(&[b.id, b.id]).unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));

        let order: Vec<i64> = db.list_sections_sync().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![a.id, b.id]);
    }

    #[test]
    fn delete_missing_section_rolls_back() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        let err = db.delete_section_sync(42).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
