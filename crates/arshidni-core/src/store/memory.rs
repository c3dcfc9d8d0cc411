//! In-memory [`CatalogStore`] implementation for tests and demos.
//!
//! Evaluates the same lookups and outer join as the SQLite store, directly
//! over a [`Catalog`]. Substring matching folds ASCII case only, like
//! SQLite's built-in `LIKE`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::{Catalog, Journey, RequirementDefinition};
use crate::error::{PipelineError, Result};
use crate::models::{JoinedRow, TargetEntity, TargetKind};

use super::{CatalogSession, CatalogStore};

/// In-memory catalog store.
pub struct InMemoryCatalog {
    catalog: Arc<Catalog>,
    offline: AtomicBool,
    sessions_opened: Arc<AtomicUsize>,
    sessions_live: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            offline: AtomicBool::new(false),
            sessions_opened: Arc::new(AtomicUsize::new(0)),
            sessions_live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every subsequent [`session`](CatalogStore::session) call fail
    /// with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of sessions acquired so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Number of sessions acquired and not yet dropped.
    pub fn sessions_live(&self) -> usize {
        self.sessions_live.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn session(&self) -> Result<Box<dyn CatalogSession>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PipelineError::connection("in-memory catalog is offline"));
        }
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.sessions_live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            catalog: self.catalog.clone(),
            live: self.sessions_live.clone(),
        }))
    }
}

struct MemorySession {
    catalog: Arc<Catalog>,
    live: Arc<AtomicUsize>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Sort key mirroring the SQL `ORDER BY`; `None` sorts first like NULL.
type RowKey = (
    Option<i64>,
    Option<i64>,
    Option<i64>,
    i64,
    Option<i64>,
    Option<i64>,
);

#[async_trait]
impl CatalogSession for MemorySession {
    async fn find_journey(&mut self, term: &str) -> Result<Option<i64>> {
        Ok(self
            .catalog
            .journeys
            .iter()
            .filter(|j| j.keyword.as_deref() == Some(term) || contains_ci(&j.name, term))
            .map(|j| j.id)
            .min())
    }

    async fn find_service(&mut self, term: &str) -> Result<Option<i64>> {
        Ok(self
            .catalog
            .services
            .iter()
            .filter(|s| {
                s.keyword.as_deref() == Some(term) || s.name == term || contains_ci(&s.name, term)
            })
            .map(|s| s.id)
            .min())
    }

    async fn fetch_rows(&mut self, target: TargetEntity) -> Result<Vec<JoinedRow>> {
        let catalog = &self.catalog;
        let entities: HashMap<i64, _> = catalog.entities.iter().map(|e| (e.id, e)).collect();
        let requirements: HashMap<i64, &RequirementDefinition> =
            catalog.requirements.iter().map(|r| (r.id, r)).collect();

        let mut keyed: Vec<(RowKey, JoinedRow)> = Vec::new();

        for service in &catalog.services {
            // Inner join: a service without its entity yields nothing.
            let Some(entity) = entities.get(&service.entity_id) else {
                continue;
            };

            let memberships: Vec<Option<(&Journey, i64)>> = {
                let found: Vec<_> = catalog
                    .journeys
                    .iter()
                    .flat_map(|j| {
                        j.services
                            .iter()
                            .enumerate()
                            .filter(|(_, sid)| **sid == service.id)
                            .map(move |(pos, _)| Some((j, pos as i64 + 1)))
                    })
                    .collect();
                if found.is_empty() {
                    vec![None]
                } else {
                    found
                }
            };

            let keep = match target.kind {
                TargetKind::Service => service.id == target.id,
                TargetKind::Journey => memberships
                    .iter()
                    .any(|m| m.map(|(j, _)| j.id) == Some(target.id)),
            };
            if !keep {
                continue;
            }

            let steps: Vec<_> = catalog
                .steps
                .iter()
                .filter(|s| s.service_id == service.id)
                .map(Some)
                .collect();
            let steps = if steps.is_empty() { vec![None] } else { steps };

            for membership in &memberships {
                if target.kind == TargetKind::Journey
                    && membership.map(|(j, _)| j.id) != Some(target.id)
                {
                    continue;
                }
                for step in &steps {
                    let links: Vec<_> = match step {
                        Some(step) => catalog
                            .step_requirements
                            .iter()
                            .filter(|l| l.step_id == step.id)
                            .map(Some)
                            .collect(),
                        None => Vec::new(),
                    };
                    let links = if links.is_empty() { vec![None] } else { links };

                    for link in links {
                        let definition =
                            link.and_then(|l| requirements.get(&l.requirement_id).copied());
                        let key = (
                            membership.map(|(j, _)| j.id),
                            membership.map(|(_, order)| order),
                            step.map(|s| s.order),
                            service.id,
                            step.map(|s| s.id),
                            link.map(|l| l.id),
                        );
                        let row = JoinedRow {
                            journey_id: membership.map(|(j, _)| j.id),
                            journey_name: membership.map(|(j, _)| j.name.clone()),
                            service_id: service.id,
                            service_name: service.name.clone(),
                            entity_name: entity.name.clone(),
                            entity_url: entity.url.clone(),
                            step_order: step.map(|s| s.order),
                            step_description: step.map(|s| s.description.clone()),
                            requirement_name: definition.map(|d| d.display_name.clone()),
                            requirement_source: definition.and_then(|d| d.source_type.clone()),
                            requirement_required: link.map(|l| l.required),
                        };
                        keyed.push((key, row));
                    }
                }
            }
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entity, Service, Step, StepRequirement};

    fn catalog() -> Catalog {
        Catalog {
            entities: vec![Entity {
                id: 1,
                name: "البلدية".into(),
                url: "https://balady.gov.sa".into(),
            }],
            services: vec![
                Service {
                    id: 10,
                    entity_id: 1,
                    name: "رخصة بناء".into(),
                    keyword: Some("بناء".into()),
                },
                Service {
                    id: 11,
                    entity_id: 1,
                    name: "شهادة إتمام بناء".into(),
                    keyword: None,
                },
            ],
            journeys: vec![Journey {
                id: 1,
                name: "رحلة بناء منزل".into(),
                keyword: Some("بناء منزل".into()),
                services: vec![11, 10],
            }],
            steps: vec![
                Step {
                    id: 101,
                    service_id: 10,
                    order: 2,
                    description: "دفع الرسوم".into(),
                },
                Step {
                    id: 100,
                    service_id: 10,
                    order: 1,
                    description: "تقديم الطلب".into(),
                },
            ],
            requirements: vec![RequirementDefinition {
                id: 5,
                display_name: "صك الملكية".into(),
                source_type: Some("وزارة العدل".into()),
            }],
            step_requirements: vec![StepRequirement {
                id: 1,
                step_id: 100,
                requirement_id: 5,
                required: true,
            }],
        }
    }

    #[tokio::test]
    async fn journey_rows_follow_service_order() {
        let store = InMemoryCatalog::new(catalog());
        let mut session = store.session().await.unwrap();
        let rows = session.fetch_rows(TargetEntity::journey(1)).await.unwrap();

        // Service 11 is first in the journey and has no steps.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].service_id, 11);
        assert_eq!(rows[0].step_description, None);
        assert_eq!(rows[1].step_order, Some(1));
        assert_eq!(rows[1].requirement_name.as_deref(), Some("صك الملكية"));
        assert_eq!(rows[2].step_order, Some(2));
        assert_eq!(rows[2].requirement_required, None);
    }

    #[tokio::test]
    async fn sessions_are_released_on_drop() {
        let store = InMemoryCatalog::new(catalog());
        {
            let _session = store.session().await.unwrap();
            assert_eq!(store.sessions_live(), 1);
        }
        assert_eq!(store.sessions_live(), 0);
        assert_eq!(store.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn offline_store_fails_to_connect() {
        let store = InMemoryCatalog::new(catalog());
        store.set_offline(true);
        let err = store.session().await.err().unwrap();
        assert!(matches!(err, PipelineError::StoreConnection(_)));
    }

    #[test]
    fn case_folding_is_ascii_only() {
        assert!(contains_ci("Permis ÉTAT", "permis"));
        assert!(!contains_ci("Permis ÉTAT", "état"));
        assert!(contains_ci("Permis ÉTAT", "ÉTAT"));
    }

    #[tokio::test]
    async fn lookups_pick_lowest_id() {
        let store = InMemoryCatalog::new(catalog());
        let mut session = store.session().await.unwrap();
        assert_eq!(session.find_service("بناء").await.unwrap(), Some(10));
        assert_eq!(session.find_journey("منزل").await.unwrap(), Some(1));
        assert_eq!(session.find_journey("سفر").await.unwrap(), None);
    }
}
