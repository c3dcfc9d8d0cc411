//! Catalog import.
//!
//! Loads a TOML [`Catalog`] file and upserts every record into SQLite in a
//! single transaction. Rows are keyed by the ids in the file, so importing
//! the same file twice leaves the database unchanged.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use arshidni_core::catalog::Catalog;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Per-table counts of imported rows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub entities: usize,
    pub services: usize,
    pub journeys: usize,
    pub steps: usize,
    pub requirements: usize,
    pub step_requirements: usize,
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let catalog: Catalog = toml::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;
    catalog.validate()?;
    Ok(catalog)
}

/// Upsert `catalog` into the database behind `pool`.
pub async fn import_catalog(pool: &SqlitePool, catalog: &Catalog) -> Result<ImportStats> {
    let mut tx = pool.begin().await?;

    for e in &catalog.entities {
        sqlx::query(
            r#"
            INSERT INTO entities (entity_id, entity_name, entity_url) VALUES (?, ?, ?)
            ON CONFLICT(entity_id) DO UPDATE SET
                entity_name = excluded.entity_name,
                entity_url = excluded.entity_url
            "#,
        )
        .bind(e.id)
        .bind(&e.name)
        .bind(&e.url)
        .execute(&mut *tx)
        .await?;
    }

    for s in &catalog.services {
        sqlx::query(
            r#"
            INSERT INTO services (service_id, entity_id, service_name, search_keyword)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(service_id) DO UPDATE SET
                entity_id = excluded.entity_id,
                service_name = excluded.service_name,
                search_keyword = excluded.search_keyword
            "#,
        )
        .bind(s.id)
        .bind(s.entity_id)
        .bind(&s.name)
        .bind(&s.keyword)
        .execute(&mut *tx)
        .await?;
    }

    for j in &catalog.journeys {
        sqlx::query(
            r#"
            INSERT INTO complex_journeys (journey_id, journey_name, search_keyword)
            VALUES (?, ?, ?)
            ON CONFLICT(journey_id) DO UPDATE SET
                journey_name = excluded.journey_name,
                search_keyword = excluded.search_keyword
            "#,
        )
        .bind(j.id)
        .bind(&j.name)
        .bind(&j.keyword)
        .execute(&mut *tx)
        .await?;

        // The service list is replaced wholesale so reordering takes effect.
        sqlx::query("DELETE FROM journey_services WHERE journey_id = ?")
            .bind(j.id)
            .execute(&mut *tx)
            .await?;
        for (pos, service_id) in j.services.iter().enumerate() {
            sqlx::query(
                "INSERT INTO journey_services (journey_id, service_id, service_order) VALUES (?, ?, ?)",
            )
            .bind(j.id)
            .bind(service_id)
            .bind(pos as i64 + 1)
            .execute(&mut *tx)
            .await?;
        }
    }

    for st in &catalog.steps {
        sqlx::query(
            r#"
            INSERT INTO steps (step_id, service_id, step_order, step_description)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(step_id) DO UPDATE SET
                service_id = excluded.service_id,
                step_order = excluded.step_order,
                step_description = excluded.step_description
            "#,
        )
        .bind(st.id)
        .bind(st.service_id)
        .bind(st.order)
        .bind(&st.description)
        .execute(&mut *tx)
        .await?;
    }

    for r in &catalog.requirements {
        sqlx::query(
            r#"
            INSERT INTO requirement_definitions (req_def_id, req_display_name, source_type)
            VALUES (?, ?, ?)
            ON CONFLICT(req_def_id) DO UPDATE SET
                req_display_name = excluded.req_display_name,
                source_type = excluded.source_type
            "#,
        )
        .bind(r.id)
        .bind(&r.display_name)
        .bind(&r.source_type)
        .execute(&mut *tx)
        .await?;
    }

    for l in &catalog.step_requirements {
        sqlx::query(
            r#"
            INSERT INTO service_requirements (service_req_id, step_id, req_def_id, is_required)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(service_req_id) DO UPDATE SET
                step_id = excluded.step_id,
                req_def_id = excluded.req_def_id,
                is_required = excluded.is_required
            "#,
        )
        .bind(l.id)
        .bind(l.step_id)
        .bind(l.requirement_id)
        .bind(l.required)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(ImportStats {
        entities: catalog.entities.len(),
        services: catalog.services.len(),
        journeys: catalog.journeys.len(),
        steps: catalog.steps.len(),
        requirements: catalog.requirements.len(),
        step_requirements: catalog.step_requirements.len(),
    })
}

/// CLI entry point for `arshidni import`.
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let catalog = load_catalog(path)?;
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let stats = import_catalog(&pool, &catalog).await?;
    pool.close().await;

    info!(file = %path.display(), ?stats, "catalog imported");
    println!("Import {}", path.display());
    println!("  entities:          {}", stats.entities);
    println!("  services:          {}", stats.services);
    println!("  journeys:          {}", stats.journeys);
    println!("  steps:             {}", stats.steps);
    println!("  requirements:      {}", stats.requirements);
    println!("  step requirements: {}", stats.step_requirements);
    println!("ok");
    Ok(())
}
