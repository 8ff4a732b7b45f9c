//! # Caller Role Model
//!
//! One `Role` definition for the whole platform, matched exhaustively at
//! every policy check. The role is resolved by the identity layer and
//! carried on the caller identity; domain operations trust it but never
//! fetch it themselves.

use serde::{Deserialize, Serialize};

use crate::CompanyId;

/// Capability level of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    /// Platform operator. May approve or reject any company's review and
    /// read any record.
    SuperAdmin,
    /// Administrator of a single company. May edit that company's
    /// onboarding data and submit it for review.
    CompanyAdmin {
        /// The company this caller administers.
        company_id: CompanyId,
    },
    /// Regular member of a single company. Read-only access to that
    /// company's records.
    Employee {
        /// The company this caller belongs to.
        company_id: CompanyId,
    },
}

impl Role {
    /// `true` for platform operators.
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// `true` when the caller may administer the given company.
    /// Super admins administer every company.
    pub fn administers(&self, company: CompanyId) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::CompanyAdmin { company_id } => *company_id == company,
            Role::Employee { .. } => false,
        }
    }

    /// `true` when the caller may read the given company's records.
    pub fn can_read(&self, company: CompanyId) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::CompanyAdmin { company_id } | Role::Employee { company_id } => {
                *company_id == company
            }
        }
    }

    /// The company this role is scoped to, if any.
    pub fn company_scope(&self) -> Option<CompanyId> {
        match self {
            Role::SuperAdmin => None,
            Role::CompanyAdmin { company_id } | Role::Employee { company_id } => Some(*company_id),
        }
    }
}
