use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS entities (
        entity_id INTEGER PRIMARY KEY,
        entity_name TEXT NOT NULL,
        entity_url TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        service_id INTEGER PRIMARY KEY,
        entity_id INTEGER NOT NULL,
        service_name TEXT NOT NULL,
        search_keyword TEXT,
        FOREIGN KEY (entity_id) REFERENCES entities(entity_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS complex_journeys (
        journey_id INTEGER PRIMARY KEY,
        journey_name TEXT NOT NULL,
        search_keyword TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journey_services (
        journey_id INTEGER NOT NULL,
        service_id INTEGER NOT NULL,
        service_order INTEGER NOT NULL,
        PRIMARY KEY (journey_id, service_id),
        FOREIGN KEY (journey_id) REFERENCES complex_journeys(journey_id),
        FOREIGN KEY (service_id) REFERENCES services(service_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS steps (
        step_id INTEGER PRIMARY KEY,
        service_id INTEGER NOT NULL,
        step_order INTEGER NOT NULL,
        step_description TEXT NOT NULL,
        FOREIGN KEY (service_id) REFERENCES services(service_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS requirement_definitions (
        req_def_id INTEGER PRIMARY KEY,
        req_display_name TEXT NOT NULL,
        source_type TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_requirements (
        service_req_id INTEGER PRIMARY KEY,
        step_id INTEGER NOT NULL,
        req_def_id INTEGER NOT NULL,
        is_required INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY (step_id) REFERENCES steps(step_id),
        FOREIGN KEY (req_def_id) REFERENCES requirement_definitions(req_def_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_services_entity ON services(entity_id)",
    "CREATE INDEX IF NOT EXISTS idx_journey_services_service ON journey_services(service_id)",
    "CREATE INDEX IF NOT EXISTS idx_steps_service ON steps(service_id, step_order)",
    "CREATE INDEX IF NOT EXISTS idx_service_requirements_step ON service_requirements(step_id)",
];

/// Create all catalog tables on an existing pool. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    info!(path = %config.db.path.display(), "schema ready");
    pool.close().await;
    Ok(())
}
