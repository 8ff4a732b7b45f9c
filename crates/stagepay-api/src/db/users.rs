//! User profile persistence operations.
//!
//! The full profile is stored as a JSONB document; `email` is broken
//! out for the uniqueness constraint among active profiles.

use sqlx::PgPool;
use uuid::Uuid;

use stagepay_domain::UserProfile;

/// Insert or replace a user profile.
pub async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    profile: &UserProfile,
) -> Result<(), sqlx::Error> {
    let doc = serde_json::to_value(profile)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to serialize user profile: {e}")))?;

    sqlx::query(
        "INSERT INTO user_profiles (id, email, active, doc, created_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE
         SET email = EXCLUDED.email, active = EXCLUDED.active, doc = EXCLUDED.doc",
    )
    .bind(profile.id.as_uuid())
    .bind(&profile.email)
    .bind(profile.lifecycle.is_active())
    .bind(&doc)
    .bind(profile.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Load all user profiles for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<UserProfile>, sqlx::Error> {
    let rows =
        sqlx::query_as::<_, UserRow>("SELECT id, doc FROM user_profiles ORDER BY created_at")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().filter_map(UserRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    doc: serde_json::Value,
}

impl UserRow {
    fn into_record(self) -> Option<UserProfile> {
        match serde_json::from_value(self.doc) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "failed to deserialize user profile, skipping");
                None
            }
        }
    }
}
