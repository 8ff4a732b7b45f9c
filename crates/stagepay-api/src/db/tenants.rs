//! Tenant persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stagepay_core::Lifecycle;
use stagepay_domain::Tenant;

/// Insert or replace a tenant record.
pub async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    tenant: &Tenant,
) -> Result<(), sqlx::Error> {
    let lifecycle = serde_json::to_value(tenant.lifecycle)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize tenant lifecycle: {e}")))?;

    sqlx::query(
        "INSERT INTO tenants (id, name, code, lifecycle, created_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE
         SET name = EXCLUDED.name, code = EXCLUDED.code, lifecycle = EXCLUDED.lifecycle",
    )
    .bind(tenant.id.as_uuid())
    .bind(&tenant.name)
    .bind(&tenant.code)
    .bind(&lifecycle)
    .bind(tenant.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Load all tenants for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Tenant>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TenantRow>(
        "SELECT id, name, code, lifecycle, created_at FROM tenants ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TenantRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    code: String,
    lifecycle: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_record(self) -> Tenant {
        let lifecycle = serde_json::from_value(self.lifecycle).unwrap_or_else(|e| {
            tracing::warn!(id = %self.id, error = %e, "bad tenant lifecycle in database, treating as active");
            Lifecycle::Active
        });
        Tenant {
            id: self.id.into(),
            name: self.name,
            code: self.code,
            lifecycle,
            created_at: self.created_at,
        }
    }
}
