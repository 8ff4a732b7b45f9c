//! Review and approval-job persistence operations.
//!
//! `company_reviews` keeps the full decision history; the partial
//! unique index (`WHERE status = 'pending'`) backs the single-pending
//! invariant at the persistence layer. `approval_jobs` records the
//! fan-out outbox: approve writes the review row and the job row in
//! one transaction, the worker marks the job done when it completes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use stagepay_core::ReviewId;
use stagepay_domain::{CompanyReview, ReviewStatus};

/// Insert a fresh pending review.
pub async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    review: &CompanyReview,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO company_reviews (id, company_id, status, submitted_at, reviewed_at, reviewed_by, review_notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(review.id.as_uuid())
    .bind(review.company_id.as_uuid())
    .bind(review.status.as_str())
    .bind(review.submitted_at)
    .bind(review.reviewed_at)
    .bind(review.reviewed_by.map(|id| id.as_uuid()))
    .bind(&review.review_notes)
    .execute(executor)
    .await?;

    Ok(())
}

/// Write a review's decision fields.
pub async fn update_decision(
    executor: impl sqlx::PgExecutor<'_>,
    review: &CompanyReview,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE company_reviews
         SET status = $1, reviewed_at = $2, reviewed_by = $3, review_notes = $4
         WHERE id = $5",
    )
    .bind(review.status.as_str())
    .bind(review.reviewed_at)
    .bind(review.reviewed_by.map(|id| id.as_uuid()))
    .bind(&review.review_notes)
    .bind(review.id.as_uuid())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a fan-out job in the outbox. Written in the same transaction
/// as the approval decision.
pub async fn enqueue_job(
    executor: impl sqlx::PgExecutor<'_>,
    review_id: ReviewId,
    company_id: stagepay_core::CompanyId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO approval_jobs (review_id, company_id, enqueued_at)
         VALUES ($1, $2, NOW())
         ON CONFLICT (review_id) DO NOTHING",
    )
    .bind(review_id.as_uuid())
    .bind(company_id.as_uuid())
    .execute(executor)
    .await?;

    Ok(())
}

/// Mark a fan-out job as completed.
pub async fn mark_job_done(
    executor: impl sqlx::PgExecutor<'_>,
    review_id: ReviewId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE approval_jobs SET completed_at = NOW()
         WHERE review_id = $1 AND completed_at IS NULL",
    )
    .bind(review_id.as_uuid())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load the current (latest) review per company for startup hydration.
pub async fn load_current(pool: &PgPool) -> Result<Vec<CompanyReview>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT DISTINCT ON (company_id)
                id, company_id, status, submitted_at, reviewed_at, reviewed_by, review_notes
         FROM company_reviews
         ORDER BY company_id, submitted_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(ReviewRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    company_id: Uuid,
    status: String,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<Uuid>,
    review_notes: Option<String>,
}

impl ReviewRow {
    fn into_record(self) -> Option<CompanyReview> {
        let status = match self.status.as_str() {
            "pending" => ReviewStatus::Pending,
            "approved" => ReviewStatus::Approved,
            "rejected" => ReviewStatus::Rejected,
            other => {
                tracing::warn!(id = %self.id, status = %other, "unknown review status in database, skipping");
                return None;
            }
        };
        Some(CompanyReview {
            id: self.id.into(),
            company_id: self.company_id.into(),
            status,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            reviewed_by: self.reviewed_by.map(Into::into),
            review_notes: self.review_notes,
        })
    }
}
