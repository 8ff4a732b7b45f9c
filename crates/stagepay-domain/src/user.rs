//! # User Profiles
//!
//! The people who drive the workflow: platform operators (super admins)
//! and company members. A profile carries at most one company membership;
//! the caller's effective [`Role`] is derived from the profile, never
//! fetched by the gate operations themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stagepay_core::{CompanyId, Lifecycle, Role, UserId};

/// Capability a member holds within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Employee,
}

/// Membership of a user in a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMembership {
    pub company_id: CompanyId,
    pub role: MemberRole,
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Unique among active profiles.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Platform operator flag. Independent of company membership.
    pub super_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership: Option<CompanyMembership>,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new active, non-operator profile with no membership.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name,
            last_name,
            email,
            phone: None,
            super_admin: false,
            membership: None,
            lifecycle: Lifecycle::Active,
            created_at: now,
        }
    }

    /// The seeded platform-operator profile. Deployments authenticate
    /// it with the bootstrap admin token rather than a registered one.
    pub fn operator() -> Self {
        let mut profile = Self::new(
            "Platform".to_string(),
            "Operator".to_string(),
            "operator@stagepay.local".to_string(),
            Utc::now(),
        );
        profile.super_admin = true;
        profile
    }

    /// "First Last", as shown on review records.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The caller role this profile resolves to, if any. Operators
    /// outrank membership; a profile with neither has no role and can
    /// only act on resources that accept any authenticated caller.
    pub fn role(&self) -> Option<Role> {
        if self.super_admin {
            return Some(Role::SuperAdmin);
        }
        self.membership.map(|m| match m.role {
            MemberRole::Admin => Role::CompanyAdmin {
                company_id: m.company_id,
            },
            MemberRole::Employee => Role::Employee {
                company_id: m.company_id,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile::new(
            "June".to_string(),
            "Osei".to_string(),
            "june@example.com".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(profile().full_name(), "June Osei");
    }

    #[test]
    fn fresh_profile_has_no_role() {
        assert_eq!(profile().role(), None);
    }

    #[test]
    fn super_admin_outranks_membership() {
        let mut p = profile();
        p.super_admin = true;
        p.membership = Some(CompanyMembership {
            company_id: CompanyId::new(),
            role: MemberRole::Employee,
        });
        assert_eq!(p.role(), Some(Role::SuperAdmin));
    }

    #[test]
    fn membership_maps_to_scoped_role() {
        let company_id = CompanyId::new();
        let mut p = profile();
        p.membership = Some(CompanyMembership {
            company_id,
            role: MemberRole::Admin,
        });
        assert_eq!(p.role(), Some(Role::CompanyAdmin { company_id }));

        p.membership = Some(CompanyMembership {
            company_id,
            role: MemberRole::Employee,
        });
        assert_eq!(p.role(), Some(Role::Employee { company_id }));
    }
}
