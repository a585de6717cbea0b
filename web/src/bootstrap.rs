//! Wiring of the production providers.

use crate::config::{Config, DatabaseConfig};
use crate::state::AppState;
use anyhow::{Context, Result};
use booking_core::stores::postgres::{
    self, PostgresBookingStore, PostgresIdAllocator, PostgresIdentityDirectory,
};
use booking_core::stores::{ProductionProviders, RedisLockStore};
use booking_core::{BookingEnvironment, BookingService, SystemClock};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Open the `PostgreSQL` pool and apply migrations.
///
/// # Errors
///
/// Returns error if the database is unreachable or a migration fails.
pub async fn connect_database(config: &DatabaseConfig) -> Result<PgPool> {
    // Log the host part only; the URL may carry credentials
    let target = config.url.split('@').next_back().unwrap_or("unknown");
    tracing::info!(target = %target, "Connecting to PostgreSQL");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(Some(Duration::from_secs(600)))
        .max_lifetime(Some(Duration::from_secs(1800)))
        .connect(&config.url)
        .await
        .context("failed to connect to PostgreSQL")?;

    postgres::migrate(&pool)
        .await
        .context("failed to apply migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Build the booking service over `PostgreSQL` and `Redis`.
///
/// # Errors
///
/// Returns error if either backing store cannot be reached.
pub async fn production_state(config: &Config) -> Result<AppState<ProductionProviders>> {
    let pool = connect_database(&config.database).await?;

    let locks = RedisLockStore::new(&config.redis_url)
        .await
        .context("failed to connect to Redis")?;
    tracing::info!("Redis lock store connected");

    let env = BookingEnvironment::<ProductionProviders>::new(
        PostgresBookingStore::new(pool.clone()),
        locks,
        PostgresIdAllocator::new(pool.clone()),
        PostgresIdentityDirectory::new(pool),
        Arc::new(SystemClock),
    );

    Ok(AppState::new(Arc::new(BookingService::new(
        env,
        config.booking.clone(),
    ))))
}
