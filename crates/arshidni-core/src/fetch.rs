//! Record fetching for a resolved target.

use tracing::debug;

use crate::error::Result;
use crate::models::{JoinedRow, TargetEntity};
use crate::store::CatalogSession;

/// Fetch the joined rows for `target` through an already-acquired session.
///
/// Zero rows is a normal outcome, not an error.
pub async fn fetch(session: &mut dyn CatalogSession, target: TargetEntity) -> Result<Vec<JoinedRow>> {
    let rows = session.fetch_rows(target).await?;
    debug!(kind = %target.kind, id = target.id, rows = rows.len(), "fetched joined rows");
    Ok(rows)
}
