//! PostgreSQL identity directory.
//!
//! Reads the `requesters` and `providers` tables. Rows are written by the
//! profile management side of the application.

use super::db_error;
use crate::error::Result;
use crate::providers::IdentityDirectory;
use crate::types::{ProviderId, RequesterId, RequesterProfile};
use sqlx::PgPool;

/// PostgreSQL identity directory.
#[derive(Clone)]
pub struct PostgresIdentityDirectory {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresIdentityDirectory {
    /// Create a new directory on a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IdentityDirectory for PostgresIdentityDirectory {
    async fn requester(&self, requester_id: &RequesterId) -> Result<Option<RequesterProfile>> {
        let active: Option<bool> = sqlx::query_scalar("SELECT active FROM requesters WHERE id = $1")
            .bind(requester_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to look up requester"))?;

        Ok(active.map(|active| RequesterProfile {
            id: requester_id.clone(),
            active,
        }))
    }

    async fn provider_exists(&self, provider_id: &ProviderId) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM providers WHERE id = $1)")
            .bind(provider_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to look up provider"))
    }
}
