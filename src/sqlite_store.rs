//! SQLite-backed [`CatalogStore`] implementation.
//!
//! Each [`CatalogStore::session`] call acquires one pooled connection; the
//! connection goes back to the pool when the session is dropped.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use arshidni_core::error::{PipelineError, Result};
use arshidni_core::models::{JoinedRow, TargetEntity, TargetKind};
use arshidni_core::store::{CatalogSession, CatalogStore};

/// SQLite implementation of the [`CatalogStore`] trait.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn session(&self) -> Result<Box<dyn CatalogSession>> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(PipelineError::connection)?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

struct SqliteSession {
    conn: PoolConnection<Sqlite>,
}

/// `%term%` with LIKE wildcards in `term` escaped by `\`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const JOIN_QUERY: &str = r#"
    SELECT
        J.journey_id, J.journey_name, S.service_id, S.service_name,
        E.entity_name, E.entity_url, ST.step_order, ST.step_description,
        RD.req_display_name, RD.source_type, SR.is_required
    FROM services S
    JOIN entities E ON S.entity_id = E.entity_id
    LEFT JOIN journey_services JS ON S.service_id = JS.service_id
    LEFT JOIN complex_journeys J ON JS.journey_id = J.journey_id
    LEFT JOIN steps ST ON S.service_id = ST.service_id
    LEFT JOIN service_requirements SR ON ST.step_id = SR.step_id
    LEFT JOIN requirement_definitions RD ON SR.req_def_id = RD.req_def_id
"#;

const JOIN_ORDER: &str = r#"
    ORDER BY J.journey_id, JS.service_order, ST.step_order,
             S.service_id, ST.step_id, SR.service_req_id
"#;

fn decode_row(row: &SqliteRow) -> std::result::Result<JoinedRow, sqlx::Error> {
    Ok(JoinedRow {
        journey_id: row.try_get("journey_id")?,
        journey_name: row.try_get("journey_name")?,
        service_id: row.try_get("service_id")?,
        service_name: row.try_get("service_name")?,
        entity_name: row.try_get("entity_name")?,
        entity_url: row.try_get("entity_url")?,
        step_order: row.try_get("step_order")?,
        step_description: row.try_get("step_description")?,
        requirement_name: row.try_get("req_display_name")?,
        requirement_source: row.try_get("source_type")?,
        requirement_required: row.try_get("is_required")?,
    })
}

#[async_trait]
impl CatalogSession for SqliteSession {
    async fn find_journey(&mut self, term: &str) -> Result<Option<i64>> {
        sqlx::query_scalar(
            r"SELECT journey_id FROM complex_journeys
              WHERE search_keyword = ? OR journey_name LIKE ? ESCAPE '\'
              ORDER BY journey_id
              LIMIT 1",
        )
        .bind(term)
        .bind(like_pattern(term))
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(PipelineError::query)
    }

    async fn find_service(&mut self, term: &str) -> Result<Option<i64>> {
        sqlx::query_scalar(
            r"SELECT service_id FROM services
              WHERE search_keyword = ? OR service_name = ? OR service_name LIKE ? ESCAPE '\'
              ORDER BY service_id
              LIMIT 1",
        )
        .bind(term)
        .bind(term)
        .bind(like_pattern(term))
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(PipelineError::query)
    }

    async fn fetch_rows(&mut self, target: TargetEntity) -> Result<Vec<JoinedRow>> {
        let filter = match target.kind {
            TargetKind::Journey => "WHERE J.journey_id = ?",
            TargetKind::Service => "WHERE S.service_id = ?",
        };
        let sql = format!("{}{}{}", JOIN_QUERY, filter, JOIN_ORDER);

        let rows = sqlx::query(&sql)
            .bind(target.id)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(PipelineError::query)?;

        rows.iter()
            .map(decode_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(PipelineError::query)
    }
}
