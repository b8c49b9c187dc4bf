use chrono::Utc;

use mytodo_core::section::{CreateSection, Section, UpdateSection};

use super::super::{pg_err, pg_not_found, PostgresDatabase};
use crate::DbError;

const SECTION_SELECT: &str = "SELECT s.id, s.name, s.icon, s.sort_order,
        (SELECT COUNT(*) FROM tasks t
          WHERE t.section_id = s.id AND NOT t.is_deleted AND NOT t.is_completed) AS task_count
     FROM sections s";

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: i64,
    name: String,
    icon: String,
    sort_order: i64,
    task_count: i64,
}

impl From<SectionRow> for Section {
    fn from(r: SectionRow) -> Self {
        Section {
            id: r.id,
            name: r.name,
            icon: r.icon,
            sort_order: r.sort_order,
            task_count: r.task_count,
        }
    }
}

impl PostgresDatabase {
    pub(crate) async fn pg_list_sections(&self) -> Result<Vec<Section>, DbError> {
        let rows = sqlx::query_as::<_, SectionRow>(&format!(
            "{SECTION_SELECT} ORDER BY s.sort_order ASC, s.id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(rows.into_iter().map(Section::from).collect())
    }

    pub(crate) async fn pg_get_section(&self, id: i64) -> Result<Section, DbError> {
        let row = sqlx::query_as::<_, SectionRow>(&format!("{SECTION_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?
            .ok_or_else(|| pg_not_found(&format!("section {id}")))?;

        Ok(row.into())
    }

    pub(crate) async fn pg_create_section(&self, input: &CreateSection) -> Result<Section, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO sections (name, icon, sort_order, created_at)
             VALUES ($1, $2, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM sections), $3)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.icon_or_default())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(pg_err)?;

        self.pg_get_section(id).await
    }

    pub(crate) async fn pg_update_section(
        &self,
        id: i64,
        update: &UpdateSection,
    ) -> Result<Section, DbError> {
        if update.is_empty() {
            return Err(DbError::InvalidInput("no fields to update".into()));
        }

        enum ParamValue {
            Str(String),
            Int(i64),
        }
        let mut sets = Vec::new();
        let mut params: Vec<ParamValue> = Vec::new();

        if let Some(ref name) = update.name {
            params.push(ParamValue::Str(name.clone()));
            sets.push(format!("name = ${}", params.len()));
        }
        if let Some(ref icon) = update.icon {
            params.push(ParamValue::Str(icon.clone()));
            sets.push(format!("icon = ${}", params.len()));
        }
        if let Some(sort_order) = update.sort_order {
            params.push(ParamValue::Int(sort_order));
            sets.push(format!("sort_order = ${}", params.len()));
        }

        let sql = format!(
            "UPDATE sections SET {} WHERE id = ${}",
            sets.join(", "),
            params.len() + 1
        );
        let mut query = sqlx::query(&sql);
        for p in &params {
            query = match p {
                ParamValue::Str(s) => query.bind(s),
                ParamValue::Int(i) => query.bind(i),
            };
        }
        let result = query.bind(id).execute(&self.pool).await.map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("section {id}")));
        }
        self.pg_get_section(id).await
    }

    pub(crate) async fn pg_reorder_sections(&self, ids: &[i64]) -> Result<Vec<Section>, DbError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        let mut existing: Vec<i64> = sqlx::query_scalar("SELECT id FROM sections FOR UPDATE")
            .fetch_all(&mut *tx)
            .await
            .map_err(pg_err)?;
        existing.sort_unstable();
        let mut requested = ids.to_vec();
        requested.sort_unstable();
        if existing != requested {
            return Err(DbError::InvalidInput(
                "sectionIds must list every section exactly once".into(),
            ));
        }

        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE sections SET sort_order = $1 WHERE id = $2")
                .bind(index as i64 + 1)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(pg_err)?;
        }
        tx.commit().await.map_err(pg_err)?;

        self.pg_list_sections().await
    }

    pub(crate) async fn pg_delete_section(&self, id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        sqlx::query("UPDATE tasks SET section_id = NULL WHERE section_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;

        if result.rows_affected() == 0 {
            return Err(pg_not_found(&format!("section {id}")));
        }
        tx.commit().await.map_err(pg_err)
    }
}
