//! Company membership routes.
//!
//! A profile holds at most one membership, so granting one is an
//! exclusive claim: joining a second company requires leaving the
//! first. Admins manage the roster; employees get read-only access to
//! the company aggregate. Ownership is not a membership and survives
//! roster edits.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_core::UserId;
use stagepay_domain::{CompanyMembership, MemberRole, UserProfile};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::companies::{ensure_manage, ensure_read, fetch_company};
use crate::state::AppState;

/// Build the membership router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/companies/{id}/members",
            post(add_member).get(list_members),
        )
        .route(
            "/v1/companies/{id}/members/{user_id}",
            delete(remove_member),
        )
}

/// Request to put a user on the company roster.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    /// `admin` or `employee`.
    #[schema(value_type = String)]
    pub role: MemberRole,
}

impl Validate for AddMemberRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// One roster entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    /// `admin` or `employee`.
    #[schema(value_type = String)]
    pub role: MemberRole,
}

impl MemberResponse {
    fn from_record(profile: &UserProfile, role: MemberRole) -> Self {
        Self {
            user_id: profile.id.as_uuid(),
            full_name: profile.full_name(),
            email: profile.email.clone(),
            role,
        }
    }
}

async fn persist_profile(state: &AppState, profile: &UserProfile) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        crate::db::users::upsert(pool, profile)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist membership: {e}")))?;
    }
    Ok(())
}

/// POST /v1/companies/{id}/members — Add or re-role a member.
///
/// Granting a role the user already holds elsewhere is a 409: one
/// membership per profile. Re-granting within the same company updates
/// the role in place.
#[utoipa::path(
    post,
    path = "/v1/companies/{id}/members",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberResponse),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company or user"),
        (status = 409, description = "User already belongs to another company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "members"
)]
pub async fn add_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MemberResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let company = fetch_company(&state, id.into())?;
    ensure_manage(&caller, &company)?;

    let user_id: UserId = req.user_id.into();
    let updated = state
        .users
        .try_update(&user_id, |profile| {
            if !profile.lifecycle.is_active() {
                return Err(AppError::NotFound(format!(
                    "user {} not found",
                    req.user_id
                )));
            }
            if profile.super_admin {
                return Err(AppError::Validation(
                    "platform operators do not hold company memberships".into(),
                ));
            }
            if let Some(existing) = profile.membership {
                if existing.company_id != company.id {
                    return Err(AppError::Conflict(format!(
                        "user {} already belongs to company {}",
                        req.user_id, existing.company_id
                    )));
                }
            }
            profile.membership = Some(CompanyMembership {
                company_id: company.id,
                role: req.role,
            });
            Ok(profile.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", req.user_id)))??;

    persist_profile(&state, &updated).await?;

    tracing::info!(
        company_id = %company.id,
        user_id = %updated.id,
        role = ?req.role,
        "company member added"
    );
    Ok((
        StatusCode::CREATED,
        Json(MemberResponse::from_record(&updated, req.role)),
    ))
}

/// GET /v1/companies/{id}/members — The company roster.
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/members",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Roster entries", body = [MemberResponse]),
        (status = 403, description = "No access to this company"),
        (status = 404, description = "No such company"),
    ),
    tag = "members"
)]
pub async fn list_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;

    let mut members: Vec<MemberResponse> = state
        .users
        .list()
        .into_iter()
        .filter(|p| p.lifecycle.is_active())
        .filter_map(|p| {
            p.membership
                .filter(|m| m.company_id == company.id)
                .map(|m| MemberResponse::from_record(&p, m.role))
        })
        .collect();
    members.sort_by(|a, b| a.email.cmp(&b.email));
    Ok(Json(members))
}

/// DELETE /v1/companies/{id}/members/{user_id} — Take a user off the
/// roster. Their tokens stay valid; only the company scope is gone.
#[utoipa::path(
    delete,
    path = "/v1/companies/{id}/members/{user_id}",
    params(
        ("id" = Uuid, Path, description = "Company id"),
        ("user_id" = Uuid, Path, description = "User id"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "Not a member of this company"),
    ),
    tag = "members"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_manage(&caller, &company)?;

    let target: UserId = user_id.into();
    let updated = state
        .users
        .try_update(&target, |profile| {
            match profile.membership {
                Some(m) if m.company_id == company.id => {
                    profile.membership = None;
                    Ok(profile.clone())
                }
                _ => Err(AppError::NotFound(format!(
                    "user {user_id} is not a member of company {id}"
                ))),
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))??;

    persist_profile(&state, &updated).await?;

    tracing::info!(company_id = %company.id, user_id = %updated.id, "company member removed");
    Ok(StatusCode::NO_CONTENT)
}
