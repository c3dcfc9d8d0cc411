//! Two-tier entity resolution.
//!
//! Journeys are looked up first; services only when no journey matched.
//! The first row the store returns wins; there is no scoring.

use tracing::debug;

use crate::error::Result;
use crate::models::{SearchTerm, TargetEntity};
use crate::store::CatalogSession;

/// Resolve `term` to at most one journey or service.
///
/// An empty term resolves to nothing without touching the store. Store
/// failures are returned to the caller, which treats them as "no match".
pub async fn resolve(
    session: &mut dyn CatalogSession,
    term: &SearchTerm,
) -> Result<Option<TargetEntity>> {
    if term.is_empty() {
        return Ok(None);
    }

    if let Some(id) = session.find_journey(term.as_str()).await? {
        debug!(%term, journey_id = id, "resolved to journey");
        return Ok(Some(TargetEntity::journey(id)));
    }

    if let Some(id) = session.find_service(term.as_str()).await? {
        debug!(%term, service_id = id, "resolved to service");
        return Ok(Some(TargetEntity::service(id)));
    }

    debug!(%term, "no journey or service matched");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Entity, Journey, Service};
    use crate::models::TargetKind;
    use crate::store::memory::InMemoryCatalog;
    use crate::store::CatalogStore;

    fn store() -> InMemoryCatalog {
        InMemoryCatalog::new(Catalog {
            entities: vec![Entity {
                id: 1,
                name: "وزارة".into(),
                url: "https://example.gov.sa".into(),
            }],
            services: vec![
                Service {
                    id: 7,
                    entity_id: 1,
                    name: "تسجيل مولود جديد".into(),
                    keyword: None,
                },
                Service {
                    id: 8,
                    entity_id: 1,
                    name: "تجديد رخصة القيادة".into(),
                    keyword: Some("تجديد رخصة".into()),
                },
            ],
            journeys: vec![Journey {
                id: 3,
                name: "رحلة المولود".into(),
                keyword: Some("مولود".into()),
                services: vec![7],
            }],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn journey_wins_over_matching_service() {
        let store = store();
        let mut session = store.session().await.unwrap();
        // "مولود" is the journey keyword and also a substring of service 7.
        let target = resolve(session.as_mut(), &SearchTerm::new("مولود"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.kind, TargetKind::Journey);
        assert_eq!(target.id, 3);
    }

    #[tokio::test]
    async fn falls_through_to_service() {
        let store = store();
        let mut session = store.session().await.unwrap();
        let target = resolve(session.as_mut(), &SearchTerm::new("تجديد رخصة"))
            .await
            .unwrap();
        assert_eq!(target, Some(TargetEntity::service(8)));
    }

    #[tokio::test]
    async fn no_match_and_empty_term_resolve_to_none() {
        let store = store();
        let mut session = store.session().await.unwrap();
        assert_eq!(
            resolve(session.as_mut(), &SearchTerm::new("أهلاً")).await.unwrap(),
            None
        );
        assert_eq!(
            resolve(session.as_mut(), &SearchTerm::default()).await.unwrap(),
            None
        );
    }
}
