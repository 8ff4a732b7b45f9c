//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor: in-memory stores for tenants, users,
//! companies, and reviews; the API token registry; the approval job
//! sender; and an optional Postgres pool for write-through persistence.
//!
//! When `DATABASE_URL` is absent the service runs purely in-memory,
//! which is also how the test suite drives it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use stagepay_core::{CompanyId, TenantId, UserId};
use stagepay_domain::{Company, CompanyReview, Tenant, UserProfile};

use crate::jobs::{ApprovalQueue, ApprovalReceiver};

// ── Secrets ─────────────────────────────────────────────────────────────────

/// A secret value that zeroizes its backing memory on drop and compares
/// in constant time. `Debug` is redacted so the value cannot leak into
/// logs.
#[derive(Clone)]
pub struct SecretString(Arc<Zeroizing<String>>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(Zeroizing::new(value.into())))
    }

    /// Constant-time comparison against a caller-provided candidate.
    ///
    /// Length mismatches run a dummy comparison so timing does not
    /// reveal the secret's length.
    pub fn matches(&self, candidate: &str) -> bool {
        let secret = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if secret.len() != candidate.len() {
            let _ = secret.ct_eq(secret);
            return false;
        }
        secret.ct_eq(candidate).into()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

// ── Configuration ───────────────────────────────────────────────────────────

/// Application configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token granting platform-operator access.
    /// If `None`, authentication is disabled and every request runs as
    /// the platform operator (development mode).
    pub admin_token: Option<SecretString>,
    /// Email address that, when registered, is bootstrapped as a
    /// super admin. Matched case-insensitively.
    pub bootstrap_admin_email: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_token: None,
            bootstrap_admin_email: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from `STAGEPAY_*` environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("STAGEPAY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let admin_token = std::env::var("STAGEPAY_ADMIN_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::new);
        let bootstrap_admin_email = std::env::var("STAGEPAY_BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .filter(|v| !v.is_empty());
        Self {
            port,
            admin_token,
            bootstrap_admin_email,
        }
    }
}

// ── Generic In-Memory Store ─────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable, so a panicking writer does
/// not permanently corrupt the store.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Find the first record matching a predicate.
    pub fn find(&self, pred: impl Fn(&V) -> bool) -> Option<V> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None`
    /// if the key is absent.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(key) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives `&mut V` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record does not exist, `Some(result)` with
    /// the closure's `Result` otherwise.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Atomically validate-and-replace the record at a key.
    ///
    /// The closure sees the current value (if any) and decides whether
    /// the slot may be (re)written. Check and write happen under one
    /// write lock; two concurrent callers serialize and the second sees
    /// the first one's value.
    pub fn try_upsert<R, E>(
        &self,
        key: K,
        f: impl FnOnce(Option<&V>) -> Result<(V, R), E>,
    ) -> Result<R, E> {
        let mut guard = self.data.write();
        let (value, result) = f(guard.get(&key))?;
        guard.insert(key, value);
        Ok(result)
    }

    /// Remove a record by key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Store<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

// ── Token Registry ──────────────────────────────────────────────────────────

/// In-memory registry mapping API bearer tokens to user ids.
///
/// Stands in for an external identity provider: registration hands out
/// a token, the auth middleware resolves it back to a profile. Tokens
/// are never persisted.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh random token for a user and register it.
    pub fn issue(&self, user_id: UserId) -> String {
        let token = format!(
            "spk_{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        self.tokens.write().insert(token.clone(), user_id);
        token
    }

    /// Resolve a presented token to a user id.
    ///
    /// Scans all registered tokens with constant-time comparison so a
    /// near-miss token costs the same as a total miss.
    pub fn resolve(&self, presented: &str) -> Option<UserId> {
        let guard = self.tokens.read();
        let presented = presented.as_bytes();
        let mut found = None;
        for (token, user_id) in guard.iter() {
            let token = token.as_bytes();
            if token.len() == presented.len() && bool::from(token.ct_eq(presented)) {
                found = Some(*user_id);
            }
        }
        found
    }

    /// Revoke every token held by a user.
    pub fn revoke_user(&self, user_id: UserId) {
        self.tokens.write().retain(|_, uid| *uid != user_id);
    }
}

// ── Application State ───────────────────────────────────────────────────────

/// Shared application state accessible to all route handlers.
/// Clone-friendly via `Arc` internals in each store.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tenants: Store<TenantId, Tenant>,
    pub users: Store<UserId, UserProfile>,
    pub companies: Store<CompanyId, Company>,
    /// Reviews keyed by company: the store key enforces the one-review-
    /// per-company shape; the single-pending invariant is enforced in
    /// the submit path under the same write lock.
    pub reviews: Store<CompanyId, CompanyReview>,
    pub tokens: TokenRegistry,

    /// Sender side of the approval fan-out queue.
    pub approval_jobs: ApprovalQueue,

    /// The seeded platform-operator profile the admin token resolves to.
    pub operator_id: UserId,

    /// PostgreSQL pool for durable persistence. When `None`, the API
    /// operates in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create application state with default configuration and no
    /// database. Returns the state and the receiver half of the
    /// approval queue, to be handed to [`crate::jobs::spawn_worker`].
    pub fn new() -> (Self, ApprovalReceiver) {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create application state with the given configuration and
    /// optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> (Self, ApprovalReceiver) {
        let (queue, receiver) = ApprovalQueue::new();

        let users = Store::new();
        let operator = UserProfile::operator();
        let operator_id = operator.id;
        users.insert(operator_id, operator);

        let state = Self {
            tenants: Store::new(),
            users,
            companies: Store::new(),
            reviews: Store::new(),
            tokens: TokenRegistry::new(),
            approval_jobs: queue,
            operator_id,
            db_pool,
            config: Arc::new(config),
        };
        (state, receiver)
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a pool is available, so read paths
    /// stay fast and synchronous afterwards.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let tenants = crate::db::tenants::load_all(pool).await?;
        let tenant_count = tenants.len();
        for tenant in tenants {
            self.tenants.insert(tenant.id, tenant);
        }

        let users = crate::db::users::load_all(pool).await?;
        let user_count = users.len();
        for user in users {
            self.users.insert(user.id, user);
        }

        let companies = crate::db::companies::load_all(pool).await?;
        let company_count = companies.len();
        for company in companies {
            self.companies.insert(company.id, company);
        }

        let reviews = crate::db::reviews::load_current(pool).await?;
        let review_count = reviews.len();
        for review in reviews {
            self.reviews.insert(review.company_id, review);
        }

        tracing::info!(
            tenants = tenant_count,
            users = user_count,
            companies = company_count,
            reviews = review_count,
            "hydrated in-memory stores from database"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_tenant() -> Tenant {
        Tenant::new("Shubert Org".to_string(), "shubert".to_string(), Utc::now())
    }

    // ── Store tests ──────────────────────────────────────────────

    #[test]
    fn store_insert_and_get_roundtrip() {
        let store: Store<TenantId, Tenant> = Store::new();
        let tenant = sample_tenant();
        let id = tenant.id;

        assert!(store.insert(id, tenant).is_none());
        let fetched = store.get(&id).unwrap();
        assert_eq!(fetched.code, "shubert");
    }

    #[test]
    fn store_update_modifies_existing() {
        let store: Store<TenantId, Tenant> = Store::new();
        let tenant = sample_tenant();
        let id = tenant.id;
        store.insert(id, tenant);

        let updated = store.update(&id, |t| t.name = "Nederlander".to_string());
        assert_eq!(updated.unwrap().name, "Nederlander");
        assert_eq!(store.get(&id).unwrap().name, "Nederlander");
    }

    #[test]
    fn store_update_returns_none_for_missing_key() {
        let store: Store<TenantId, Tenant> = Store::new();
        assert!(store.update(&TenantId::new(), |_| {}).is_none());
    }

    #[test]
    fn store_try_update_propagates_closure_error() {
        let store: Store<TenantId, Tenant> = Store::new();
        let tenant = sample_tenant();
        let id = tenant.id;
        store.insert(id, tenant);

        let result: Option<Result<(), &str>> = store.try_update(&id, |_| Err("nope"));
        assert_eq!(result, Some(Err("nope")));

        let missing: Option<Result<(), &str>> = store.try_update(&TenantId::new(), |_| Ok(()));
        assert!(missing.is_none());
    }

    #[test]
    fn store_try_upsert_inserts_when_check_passes() {
        let store: Store<TenantId, Tenant> = Store::new();
        let tenant = sample_tenant();
        let id = tenant.id;

        let result: Result<TenantId, &str> = store.try_upsert(id, |existing| {
            assert!(existing.is_none());
            Ok((tenant.clone(), id))
        });
        assert_eq!(result, Ok(id));
        assert!(store.contains(&id));
    }

    #[test]
    fn store_try_upsert_rejects_without_writing() {
        let store: Store<TenantId, Tenant> = Store::new();
        let tenant = sample_tenant();
        let id = tenant.id;
        store.insert(id, tenant);

        let result: Result<(), &str> = store.try_upsert(id, |existing| {
            assert!(existing.is_some());
            Err("occupied")
        });
        assert_eq!(result, Err("occupied"));
        assert_eq!(store.get(&id).unwrap().code, "shubert");
    }

    #[test]
    fn store_clone_shares_underlying_data() {
        let store: Store<TenantId, Tenant> = Store::new();
        let clone = store.clone();
        let tenant = sample_tenant();
        clone.insert(tenant.id, tenant);
        assert_eq!(store.len(), 1);
    }

    // ── SecretString tests ───────────────────────────────────────

    #[test]
    fn secret_matches_exact_value() {
        let secret = SecretString::new("op-token-123");
        assert!(secret.matches("op-token-123"));
    }

    #[test]
    fn secret_rejects_wrong_prefix_and_empty() {
        let secret = SecretString::new("op-token-123");
        assert!(!secret.matches("op-token"));
        assert!(!secret.matches(""));
        assert!(!secret.matches("op-token-124"));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = SecretString::new("op-token-123");
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("op-token"));
        assert!(rendered.contains("REDACTED"));
    }

    // ── TokenRegistry tests ──────────────────────────────────────

    #[test]
    fn issued_token_resolves_to_user() {
        let registry = TokenRegistry::new();
        let user_id = UserId::new();
        let token = registry.issue(user_id);
        assert!(token.starts_with("spk_"));
        assert_eq!(registry.resolve(&token), Some(user_id));
    }

    #[test]
    fn unknown_token_does_not_resolve() {
        let registry = TokenRegistry::new();
        registry.issue(UserId::new());
        assert_eq!(registry.resolve("spk_deadbeef"), None);
    }

    #[test]
    fn revoke_user_invalidates_all_their_tokens() {
        let registry = TokenRegistry::new();
        let user_id = UserId::new();
        let t1 = registry.issue(user_id);
        let t2 = registry.issue(user_id);
        let other = registry.issue(UserId::new());

        registry.revoke_user(user_id);
        assert_eq!(registry.resolve(&t1), None);
        assert_eq!(registry.resolve(&t2), None);
        assert!(registry.resolve(&other).is_some());
    }

    // ── AppState tests ───────────────────────────────────────────

    #[test]
    fn app_state_seeds_the_operator_profile() {
        let (state, _rx) = AppState::new();
        let operator = state.users.get(&state.operator_id).unwrap();
        assert!(operator.super_admin);
        assert_eq!(state.users.len(), 1);
        assert!(state.companies.is_empty());
        assert!(state.db_pool.is_none());
    }

    #[test]
    fn app_config_default_has_no_admin_token() {
        let config = AppConfig::default();
        assert!(config.admin_token.is_none());
        assert!(config.bootstrap_admin_email.is_none());
    }
}
