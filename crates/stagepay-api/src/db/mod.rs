//! # Postgres Persistence
//!
//! Write-through persistence for the in-memory stores. Reads are served
//! from memory; every mutation that succeeds in memory is written here
//! when a pool is attached, and startup hydrates the stores from these
//! tables.
//!
//! Aggregates are stored as a JSONB document beside the scalar columns
//! used for lookups and constraints. The one-pending-review-per-company
//! invariant is backed by a partial unique index on `company_reviews`.

pub mod companies;
pub mod reviews;
pub mod tenants;
pub mod users;

use sqlx::PgPool;

/// Run embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Connect to the database named by `DATABASE_URL`, if set.
pub async fn connect_from_env() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            tracing::info!("DATABASE_URL not set, running in-memory only");
            return Ok(None);
        }
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;
    Ok(Some(pool))
}
