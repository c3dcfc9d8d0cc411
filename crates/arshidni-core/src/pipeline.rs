//! The per-query pipeline.
//!
//! ```text
//! raw query ─▶ normalize ─▶ ┌ session ───────────────┐ ─▶ route ─▶ generate ─▶ answer
//!                           │ resolve ─▶ fetch rows  │
//!                           └────────────────────────┘
//! ```
//!
//! Each query acquires exactly one store session, used for both lookup
//! phases and the join fetch, and released before generation starts.
//! Store failures never reach the user: they are logged and treated as
//! "nothing found", which routes to a general reply. Generation failures
//! are returned as errors; [`Pipeline::reply`] turns them into a message.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::fetch::fetch;
use crate::generation::TextGenerator;
use crate::models::{Answer, JoinedRow, Retrieval, SearchTerm, TargetEntity};
use crate::normalize::QueryNormalizer;
use crate::resolve::resolve;
use crate::router::{user_facing_error, ResponseRouter, Routed};
use crate::store::CatalogStore;

/// Everything needed to answer queries. Holds no per-query state.
pub struct Pipeline {
    normalizer: QueryNormalizer,
    store: Arc<dyn CatalogStore>,
    generator: Arc<dyn TextGenerator>,
    router: ResponseRouter,
}

impl Pipeline {
    pub fn new(
        normalizer: QueryNormalizer,
        store: Arc<dyn CatalogStore>,
        generator: Arc<dyn TextGenerator>,
        router: ResponseRouter,
    ) -> Self {
        Self {
            normalizer,
            store,
            generator,
            router,
        }
    }

    /// Normalize, resolve, fetch and route, without calling the generator.
    pub async fn retrieve(&self, query: &str) -> Retrieval {
        let term = self.normalizer.normalize(query).await;

        let (target, rows) = match self.lookup(&term).await {
            Ok(found) => found,
            Err(e) => {
                warn!(%term, error = %e, "store unavailable, answering without data");
                (None, Vec::new())
            }
        };

        let Routed { mode, context } = self.router.route(&rows, target.map(|t| t.kind));
        info!(%term, ?target, rows = rows.len(), %mode, "retrieval complete");

        Retrieval {
            term,
            target,
            mode,
            context,
        }
    }

    /// Answer `query`, making exactly one generation call.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let retrieval = self.retrieve(query).await;
        let routed = Routed {
            mode: retrieval.mode,
            context: retrieval.context.clone(),
        };
        let text = self
            .router
            .respond(self.generator.as_ref(), query, &routed)
            .await?;
        Ok(Answer { retrieval, text })
    }

    /// Like [`answer`](Self::answer), but always yields text for the user.
    pub async fn reply(&self, query: &str) -> String {
        match self.answer(query).await {
            Ok(answer) => answer.text,
            Err(e) => {
                warn!(error = %e, "generation failed");
                user_facing_error(&e)
            }
        }
    }

    /// One scoped session covering both lookup phases and the fetch.
    async fn lookup(&self, term: &SearchTerm) -> Result<(Option<TargetEntity>, Vec<JoinedRow>)> {
        let mut session = self.store.session().await?;
        let Some(target) = resolve(session.as_mut(), term).await? else {
            return Ok((None, Vec::new()));
        };
        let rows = fetch(session.as_mut(), target).await?;
        Ok((Some(target), rows))
    }
}
