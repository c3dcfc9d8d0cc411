//! Storage abstraction for the service catalog.
//!
//! The pipeline only ever reads from the catalog. A [`CatalogStore`] hands out
//! [`CatalogSession`]s, each wrapping one acquired connection; the connection
//! is released when the session is dropped, on every exit path.
//!
//! # Query contract
//!
//! | Method | Semantics |
//! |--------|-----------|
//! | [`find_journey`](CatalogSession::find_journey) | exact keyword or substring name match, lowest id first |
//! | [`find_service`](CatalogSession::find_service) | exact keyword/name or substring name match, lowest id first |
//! | [`fetch_rows`](CatalogSession::fetch_rows) | outer join of services, entity, journeys, steps, requirements |
//!
//! `fetch_rows` orders by journey id, service order within the journey,
//! step order, then service id, step id and requirement link id so the
//! sequence is total. NULLs sort first.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{JoinedRow, TargetEntity};

/// A source of catalog sessions (connection pool, file, in-memory data).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Acquire one scoped session. Fails with
    /// [`PipelineError::StoreConnection`](crate::error::PipelineError::StoreConnection).
    async fn session(&self) -> Result<Box<dyn CatalogSession>>;
}

/// One acquired connection to the catalog.
#[async_trait]
pub trait CatalogSession: Send {
    /// Id of the first journey whose keyword equals `term` or whose name
    /// contains it.
    async fn find_journey(&mut self, term: &str) -> Result<Option<i64>>;

    /// Id of the first service whose keyword or name equals `term` or whose
    /// name contains it.
    async fn find_service(&mut self, term: &str) -> Result<Option<i64>>;

    /// All joined rows for the target, in the fixed order described above.
    async fn fetch_rows(&mut self, target: TargetEntity) -> Result<Vec<JoinedRow>>;
}
