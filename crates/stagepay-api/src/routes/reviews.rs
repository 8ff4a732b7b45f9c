//! Review workflow routes: submit, approve, reject, status, listing.
//!
//! The two decision gates are super-admin only. Submission checks the
//! submission rule set; approval checks the stricter approval rule set
//! and, on success, records the decision and enqueues the fan-out job
//! in the same store mutation (the same SQL transaction in Postgres
//! mode). Rejection requires stated reasons and enqueues nothing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_core::ReviewId;
use stagepay_domain::{
    approval_violations, submission_violations, CompanyReview, ReviewStatus,
};

use crate::auth::{require_super_admin, CallerIdentity};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::jobs::ApprovalJob;
use crate::routes::companies::{ensure_manage, ensure_read, fetch_company};
use crate::state::AppState;

/// Build the review router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/companies/{id}/submit-for-review", post(submit_for_review))
        .route("/v1/companies/{id}/review-status", get(review_status))
        .route("/v1/reviews", get(list_reviews))
        .route("/v1/reviews/{id}", get(get_review))
        .route("/v1/reviews/{id}/approve", post(approve_review))
        .route("/v1/reviews/{id}/reject", post(reject_review))
}

// ── DTOs ────────────────────────────────────────────────────────────────────

/// Optional reviewer notes accompanying an approval.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for ApproveRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Reviewer notes accompanying a rejection. Required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub notes: String,
}

impl Validate for RejectRequest {
    fn validate(&self) -> Result<(), String> {
        // Blank notes surface as the NOTES_REQUIRED error from the
        // transition itself, so only shape is checked here.
        Ok(())
    }
}

/// A review record as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    /// `pending`, `approved`, or `rejected`.
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    /// Reviewer rendered as a full name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

impl ReviewResponse {
    fn from_record(state: &AppState, review: &CompanyReview) -> Self {
        let reviewed_by_name = review
            .reviewed_by
            .and_then(|id| state.users.get(&id))
            .map(|p| p.full_name());
        Self {
            id: review.id.as_uuid(),
            company_id: review.company_id.as_uuid(),
            status: review.status.as_str().to_string(),
            submitted_at: review.submitted_at,
            reviewed_at: review.reviewed_at,
            reviewed_by: review.reviewed_by.map(|id| id.as_uuid()),
            reviewed_by_name,
            review_notes: review.review_notes.clone(),
        }
    }
}

/// Acknowledgement of a submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub review_id: Uuid,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

/// Review state of a company, `not_submitted` included.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewStatusResponse {
    /// `not_submitted`, `pending`, `approved`, or `rejected`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Filter for the review listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ReviewListParams {
    /// Restrict to one status (`pending`, `approved`, `rejected`).
    pub status: Option<String>,
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// POST /v1/companies/{id}/submit-for-review — Open a pending review.
#[utoipa::path(
    post,
    path = "/v1/companies/{id}/submit-for-review",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 201, description = "Pending review opened", body = SubmitResponse),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 409, description = "Already pending or already approved"),
        (status = 422, description = "Submission readiness violations"),
    ),
    tag = "reviews"
)]
pub async fn submit_for_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_manage(&caller, &company)?;

    if company.suspended {
        return Err(AppError::Conflict("company is suspended".into()));
    }
    if company.approved {
        return Err(AppError::Conflict("company is already approved".into()));
    }

    let now = Utc::now();
    let violations = submission_violations(&company, now);
    if !violations.is_empty() {
        return Err(AppError::Violations(violations));
    }

    // Check-and-insert under one write lock: two racing submits cannot
    // both open a pending review. A rejected review is replaced by a
    // fresh pending record; its history stays in the database.
    let review = state.reviews.try_upsert(company.id, |existing| {
        match existing.map(|r| r.status) {
            Some(ReviewStatus::Pending) => Err(AppError::Conflict(
                "a pending review already exists for this company".into(),
            )),
            Some(ReviewStatus::Approved) => {
                Err(AppError::Conflict("company review is already approved".into()))
            }
            Some(ReviewStatus::Rejected) | None => {
                let review = CompanyReview::new_pending(company.id, now);
                Ok((review.clone(), review))
            }
        }
    })?;

    if let Some(pool) = &state.db_pool {
        crate::db::reviews::insert(pool, &review)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist review: {e}")))?;
    }

    tracing::info!(company_id = %company.id, review_id = %review.id, "company submitted for review");
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            review_id: review.id.as_uuid(),
            status: review.status.as_str().to_string(),
            submitted_at: review.submitted_at,
        }),
    ))
}

/// GET /v1/companies/{id}/review-status — Where a company stands.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/review-status",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Review state", body = ReviewStatusResponse),
        (status = 403, description = "No access to this company"),
        (status = 404, description = "No such company"),
    ),
    tag = "reviews"
)]
pub async fn review_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewStatusResponse>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;

    let response = match state.reviews.get(&company.id) {
        None => ReviewStatusResponse {
            status: "not_submitted".to_string(),
            review_id: None,
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            notes: None,
        },
        Some(review) => {
            let reviewed_by = review
                .reviewed_by
                .and_then(|id| state.users.get(&id))
                .map(|p| p.full_name());
            ReviewStatusResponse {
                status: review.status.as_str().to_string(),
                review_id: Some(review.id.as_uuid()),
                submitted_at: Some(review.submitted_at),
                reviewed_at: review.reviewed_at,
                reviewed_by,
                notes: review.review_notes,
            }
        }
    };
    Ok(Json(response))
}

/// GET /v1/reviews — Review queue, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/v1/reviews",
    params(ReviewListParams),
    responses(
        (status = 200, description = "Matching reviews", body = [ReviewResponse]),
        (status = 403, description = "Super admin capability required"),
        (status = 422, description = "Unknown status filter"),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    require_super_admin(&caller)?;

    let filter = match params.status.as_deref() {
        None => None,
        Some("pending") => Some(ReviewStatus::Pending),
        Some("approved") => Some(ReviewStatus::Approved),
        Some("rejected") => Some(ReviewStatus::Rejected),
        Some(other) => {
            return Err(AppError::Validation(format!(
                "unknown review status '{other}'"
            )))
        }
    };

    let mut reviews: Vec<CompanyReview> = state
        .reviews
        .list()
        .into_iter()
        .filter(|r| filter.map_or(true, |f| r.status == f))
        .collect();
    reviews.sort_by_key(|r| r.submitted_at);
    Ok(Json(
        reviews
            .iter()
            .map(|r| ReviewResponse::from_record(&state, r))
            .collect(),
    ))
}

/// GET /v1/reviews/{id} — Fetch one review.
#[utoipa::path(
    get,
    path = "/v1/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "The review", body = ReviewResponse),
        (status = 403, description = "No access to this review"),
        (status = 404, description = "No such review"),
    ),
    tag = "reviews"
)]
pub async fn get_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = find_review(&state, id.into())?;
    if !caller.is_super_admin() {
        let company = fetch_company(&state, review.company_id)?;
        ensure_read(&caller, &company)?;
    }
    Ok(Json(ReviewResponse::from_record(&state, &review)))
}

/// POST /v1/reviews/{id}/approve — Approve a pending review.
///
/// The approval-readiness check runs first and leaves all state
/// untouched on failure. The decision write and the fan-out enqueue
/// happen in one store mutation; Postgres mode writes the review row
/// and the outbox row in one transaction.
#[utoipa::path(
    post,
    path = "/v1/reviews/{id}/approve",
    params(("id" = Uuid, Path, description = "Review id")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Review approved, fan-out enqueued", body = ReviewResponse),
        (status = 403, description = "Super admin capability required"),
        (status = 404, description = "No such review"),
        (status = 409, description = "Review is not pending"),
        (status = 422, description = "Approval readiness violations"),
    ),
    tag = "reviews"
)]
pub async fn approve_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ApproveRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, AppError> {
    require_super_admin(&caller)?;
    let req = extract_validated_json(body)?;
    let notes = req.notes.filter(|n| !n.trim().is_empty());

    let review_id: ReviewId = id.into();
    let review = find_review(&state, review_id)?;
    let company = fetch_company(&state, review.company_id)?;

    let now = Utc::now();
    let violations = approval_violations(&company, now);
    if !violations.is_empty() {
        return Err(AppError::Violations(violations));
    }

    let (review, job) = state
        .reviews
        .try_update(&company.id, |r| {
            if r.id != review_id {
                // A fresh submission replaced this record.
                return Err(AppError::NotFound(format!("review {id} not found")));
            }
            r.approve(caller.user_id, notes.clone(), now)?;
            let job = ApprovalJob {
                company_id: r.company_id,
                review_id: r.id,
                approved_by: caller.user_id,
            };
            state
                .approval_jobs
                .enqueue(job)
                .map_err(|_| AppError::Internal("approval queue is closed".into()))?;
            Ok((r.clone(), job))
        })
        .ok_or_else(|| AppError::NotFound(format!("review {id} not found")))??;

    if let Some(pool) = &state.db_pool {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("failed to open transaction: {e}")))?;
        crate::db::reviews::update_decision(&mut *tx, &review)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist decision: {e}")))?;
        crate::db::reviews::enqueue_job(&mut *tx, job.review_id, job.company_id)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist fan-out job: {e}")))?;
        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("failed to commit decision: {e}")))?;
    }

    tracing::info!(
        review_id = %review.id,
        company_id = %review.company_id,
        reviewer = %caller.user_id,
        "review approved, fan-out enqueued"
    );
    Ok(Json(ReviewResponse::from_record(&state, &review)))
}

/// POST /v1/reviews/{id}/reject — Reject a pending review with reasons.
#[utoipa::path(
    post,
    path = "/v1/reviews/{id}/reject",
    params(("id" = Uuid, Path, description = "Review id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Review rejected", body = ReviewResponse),
        (status = 403, description = "Super admin capability required"),
        (status = 404, description = "No such review"),
        (status = 409, description = "Review is not pending"),
        (status = 422, description = "Notes are required"),
    ),
    tag = "reviews"
)]
pub async fn reject_review(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RejectRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, AppError> {
    require_super_admin(&caller)?;
    let req = extract_validated_json(body)?;

    let review_id: ReviewId = id.into();
    let review = find_review(&state, review_id)?;

    let now = Utc::now();
    let review = state
        .reviews
        .try_update(&review.company_id, |r| {
            if r.id != review_id {
                return Err(AppError::NotFound(format!("review {id} not found")));
            }
            r.reject(caller.user_id, &req.notes, now)?;
            Ok(r.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("review {id} not found")))??;

    if let Some(pool) = &state.db_pool {
        crate::db::reviews::update_decision(pool, &review)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist decision: {e}")))?;
    }

    tracing::info!(
        review_id = %review.id,
        company_id = %review.company_id,
        reviewer = %caller.user_id,
        "review rejected"
    );
    Ok(Json(ReviewResponse::from_record(&state, &review)))
}

fn find_review(state: &AppState, review_id: ReviewId) -> Result<CompanyReview, AppError> {
    state
        .reviews
        .find(|r| r.id == review_id)
        .ok_or_else(|| AppError::NotFound(format!("review {review_id} not found")))
}
