//! # Tenant
//!
//! The top-level account a set of companies belongs to. Thin by design:
//! tenancy scopes listings and ownership, nothing else in the review
//! workflow keys off it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stagepay_core::{Lifecycle, TenantId};

/// A platform tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Display name, unique among active tenants.
    pub name: String,
    /// Short code, unique among active tenants.
    pub code: String,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new active tenant.
    pub fn new(name: String, code: String, now: DateTime<Utc>) -> Self {
        Self {
            id: TenantId::new(),
            name,
            code,
            lifecycle: Lifecycle::Active,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tenant_is_active() {
        let t = Tenant::new("Shubert Org".to_string(), "shubert".to_string(), Utc::now());
        assert!(t.lifecycle.is_active());
    }
}
