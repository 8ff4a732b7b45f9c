//! User routes.
//!
//! Registration is open (the token registry stands in for an external
//! identity provider) and returns the caller's API token exactly once.
//! Everything else requires credentials.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_domain::UserProfile;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{checks, extract_validated_json, Validate};
use crate::state::AppState;

/// Routes mounted outside the auth middleware.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/v1/users", post(register_user))
}

/// Authenticated user routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/me", get(me))
        .route("/v1/users/{id}", get(get_user))
}

/// Request to register a user profile.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Digits with an optional leading `+`.
    #[serde(default)]
    pub phone: Option<String>,
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), String> {
        checks::non_blank(&self.first_name, "first_name")?;
        checks::non_blank(&self.last_name, "last_name")?;
        checks::email(&self.email)?;
        if let Some(phone) = &self.phone {
            checks::phone(phone)?;
        }
        Ok(())
    }
}

/// User profile as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub super_admin: bool,
    /// Company membership, when the user belongs to a company.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub membership: Option<stagepay_domain::CompanyMembership>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    fn from_record(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.as_uuid(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            super_admin: profile.super_admin,
            membership: profile.membership,
            created_at: profile.created_at,
        }
    }
}

/// Registration response. The token is shown exactly once.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUserResponse {
    pub user: UserResponse,
    /// API bearer token for this profile.
    pub token: String,
}

/// The caller's resolved identity.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub full_name: String,
    /// The caller's effective role, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub role: Option<stagepay_core::Role>,
}

/// POST /v1/users — Register a profile and receive an API token.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Profile registered", body = RegisteredUserResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "users"
)]
pub async fn register_user(
    State(state): State<AppState>,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUserResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let email = req.email.trim().to_lowercase();

    if state
        .users
        .find(|u| u.email.eq_ignore_ascii_case(&email) && u.lifecycle.is_active())
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "email '{email}' is already registered"
        )));
    }

    let mut profile = UserProfile::new(
        req.first_name.trim().to_string(),
        req.last_name.trim().to_string(),
        email,
        Utc::now(),
    );
    profile.phone = req.phone;
    if let Some(bootstrap) = &state.config.bootstrap_admin_email {
        if profile.email.eq_ignore_ascii_case(bootstrap) {
            profile.super_admin = true;
            tracing::info!(user_id = %profile.id, "bootstrapped super admin from configured email");
        }
    }

    let token = state.tokens.issue(profile.id);
    state.users.insert(profile.id, profile.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::users::upsert(pool, &profile)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist user: {e}")))?;
    }

    tracing::info!(user_id = %profile.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUserResponse {
            user: UserResponse::from_record(&profile),
            token,
        }),
    ))
}

/// GET /v1/me — The caller's resolved identity.
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "users"
)]
pub async fn me(caller: CallerIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: caller.user_id.as_uuid(),
        full_name: caller.full_name,
        role: caller.role,
    })
}

/// GET /v1/users/{id} — Fetch a profile. Self or super admin.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The profile", body = UserResponse),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "No such user"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = id.into();
    if caller.user_id != user_id && !caller.is_super_admin() {
        return Err(AppError::Forbidden("not your profile".into()));
    }
    let profile = state
        .users
        .get(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
    Ok(Json(UserResponse::from_record(&profile)))
}
