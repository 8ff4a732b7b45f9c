//! Configuration sub-record routes: bank, payroll, union.
//!
//! All three are upserts: a PUT replaces the record wholesale. Drafts
//! may be incomplete — completeness is the review gates' concern, not
//! the upsert's — but `approved` is never writable here and resets to
//! false on every write, so editing an approved record re-opens it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use stagepay_domain::{
    AccountType, BankConfig, Company, PayFrequency, PayrollConfig, UnionConfig, UnionMembership,
};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::companies::{ensure_manage, ensure_read, fetch_company, persist_company};
use crate::state::AppState;

/// Build the configuration router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/companies/{id}/bank-config",
            put(put_bank_config).get(get_bank_config),
        )
        .route(
            "/v1/companies/{id}/payroll-config",
            put(put_payroll_config).get(get_payroll_config),
        )
        .route(
            "/v1/companies/{id}/union-config",
            put(put_union_config).get(get_union_config),
        )
}

// ── DTOs ────────────────────────────────────────────────────────────────────

/// Bank configuration upsert. `approved` is not writable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BankConfigRequest {
    pub bank_name: String,
    pub account_number: String,
    pub routing_number_ach: String,
    pub routing_number_wire: String,
    /// `checking` or `savings`.
    #[schema(value_type = String)]
    pub account_type: AccountType,
    /// Whether the account holder has granted debit authorization.
    pub authorized: bool,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Payroll configuration upsert. `approved` is not writable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayrollConfigRequest {
    /// `weekly`, `biweekly`, `semimonthly`, or `monthly`.
    #[schema(value_type = String)]
    pub frequency: PayFrequency,
    pub period: String,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    pub check_start_number: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Union configuration upsert. The membership sum type is flattened
/// into the body (`union_type`, and for union shops `union_name` plus
/// the tagged `agreement_type` terms). `approved` is not writable.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UnionConfigRequest {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub membership: UnionMembership,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// Drafts may be incomplete; the review gates hold the completeness
// rules. Shape errors (bad enum tags, wrong types) are already 422s
// from deserialization.
impl Validate for BankConfigRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for PayrollConfigRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for UnionConfigRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

// ── Shared upsert plumbing ──────────────────────────────────────────────────

async fn upsert_config(
    state: &AppState,
    caller: &CallerIdentity,
    company_id: Uuid,
    write: impl FnOnce(&mut Company),
) -> Result<Company, AppError> {
    let company = fetch_company(state, company_id.into())?;
    ensure_manage(caller, &company)?;

    let now = Utc::now();
    let updated = state
        .companies
        .update(&company.id, |c| {
            write(c);
            c.updated_at = now;
        })
        .ok_or_else(|| AppError::NotFound(format!("company {company_id} not found")))?;

    persist_company(state, &updated).await?;
    Ok(updated)
}

// ── Bank ────────────────────────────────────────────────────────────────────

/// PUT /v1/companies/{id}/bank-config — Create or replace.
#[utoipa::path(
    put,
    path = "/v1/companies/{id}/bank-config",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = BankConfigRequest,
    responses(
        (status = 200, description = "The stored configuration", body = Object),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "configs"
)]
pub async fn put_bank_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<BankConfigRequest>, JsonRejection>,
) -> Result<Json<BankConfig>, AppError> {
    let req = extract_validated_json(body)?;
    let config = BankConfig {
        bank_name: req.bank_name,
        account_number: req.account_number,
        routing_number_ach: req.routing_number_ach,
        routing_number_wire: req.routing_number_wire,
        account_type: req.account_type,
        authorized: req.authorized,
        active: req.active,
        approved: false,
    };
    let updated = upsert_config(&state, &caller, id, |c| {
        c.bank_config = Some(config.clone());
    })
    .await?;
    // The closure always runs for an existing company.
    updated
        .bank_config
        .map(Json)
        .ok_or_else(|| AppError::Internal("bank config missing after upsert".into()))
}

/// GET /v1/companies/{id}/bank-config
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/bank-config",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "The configuration", body = Object),
        (status = 404, description = "Company or configuration missing"),
    ),
    tag = "configs"
)]
pub async fn get_bank_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<BankConfig>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;
    company
        .bank_config
        .map(Json)
        .ok_or_else(|| AppError::NotFound("bank configuration not set".into()))
}

// ── Payroll ─────────────────────────────────────────────────────────────────

/// PUT /v1/companies/{id}/payroll-config — Create or replace.
#[utoipa::path(
    put,
    path = "/v1/companies/{id}/payroll-config",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = PayrollConfigRequest,
    responses(
        (status = 200, description = "The stored configuration", body = Object),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "configs"
)]
pub async fn put_payroll_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<PayrollConfigRequest>, JsonRejection>,
) -> Result<Json<PayrollConfig>, AppError> {
    let req = extract_validated_json(body)?;
    let config = PayrollConfig {
        frequency: req.frequency,
        period: req.period,
        start_date: req.start_date,
        check_start_number: req.check_start_number,
        active: req.active,
        approved: false,
    };
    let updated = upsert_config(&state, &caller, id, |c| {
        c.payroll_config = Some(config.clone());
    })
    .await?;
    updated
        .payroll_config
        .map(Json)
        .ok_or_else(|| AppError::Internal("payroll config missing after upsert".into()))
}

/// GET /v1/companies/{id}/payroll-config
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/payroll-config",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "The configuration", body = Object),
        (status = 404, description = "Company or configuration missing"),
    ),
    tag = "configs"
)]
pub async fn get_payroll_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<PayrollConfig>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;
    company
        .payroll_config
        .map(Json)
        .ok_or_else(|| AppError::NotFound("payroll configuration not set".into()))
}

// ── Union ───────────────────────────────────────────────────────────────────

/// PUT /v1/companies/{id}/union-config — Create or replace.
///
/// Switching to `non-union` drops any previously stored agreement
/// terms, since the replacement is wholesale.
#[utoipa::path(
    put,
    path = "/v1/companies/{id}/union-config",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = UnionConfigRequest,
    responses(
        (status = 200, description = "The stored configuration", body = Object),
        (status = 403, description = "Admin capability required"),
        (status = 404, description = "No such company"),
        (status = 422, description = "Validation failure"),
    ),
    tag = "configs"
)]
pub async fn put_union_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UnionConfigRequest>, JsonRejection>,
) -> Result<Json<UnionConfig>, AppError> {
    let req = extract_validated_json(body)?;
    let config = UnionConfig {
        membership: req.membership,
        active: req.active,
        approved: false,
    };
    let updated = upsert_config(&state, &caller, id, |c| {
        c.union_config = Some(config.clone());
    })
    .await?;
    updated
        .union_config
        .map(Json)
        .ok_or_else(|| AppError::Internal("union config missing after upsert".into()))
}

/// GET /v1/companies/{id}/union-config
#[utoipa::path(
    get,
    path = "/v1/companies/{id}/union-config",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "The configuration", body = Object),
        (status = 404, description = "Company or configuration missing"),
    ),
    tag = "configs"
)]
pub async fn get_union_config(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<UnionConfig>, AppError> {
    let company = fetch_company(&state, id.into())?;
    ensure_read(&caller, &company)?;
    company
        .union_config
        .map(Json)
        .ok_or_else(|| AppError::NotFound("union configuration not set".into()))
}
