//! Company aggregate persistence operations.
//!
//! The aggregate (addresses and configuration sub-records included) is
//! stored as one JSONB document; tenant, owner, code, and the approved
//! flag are broken out for lookups and constraints.

use sqlx::PgPool;
use uuid::Uuid;

use stagepay_domain::Company;

/// Insert or replace a company aggregate.
pub async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    company: &Company,
) -> Result<(), sqlx::Error> {
    let doc = serde_json::to_value(company)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize company: {e}")))?;

    sqlx::query(
        "INSERT INTO companies (id, tenant_id, owned_by, code, approved, doc, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (id) DO UPDATE
         SET owned_by = EXCLUDED.owned_by,
             approved = EXCLUDED.approved,
             doc = EXCLUDED.doc,
             updated_at = EXCLUDED.updated_at",
    )
    .bind(company.id.as_uuid())
    .bind(company.tenant_id.as_uuid())
    .bind(company.owned_by.as_uuid())
    .bind(&company.code)
    .bind(company.approved)
    .bind(&doc)
    .bind(company.created_at)
    .bind(company.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Load all companies for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Company>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CompanyRow>("SELECT id, doc FROM companies ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().filter_map(CompanyRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    doc: serde_json::Value,
}

impl CompanyRow {
    fn into_record(self) -> Option<Company> {
        match serde_json::from_value(self.doc) {
            Ok(company) => Some(company),
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "failed to deserialize company, skipping");
                None
            }
        }
    }
}
