//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the platform.
//! Each identifier is a distinct type — you cannot pass a [`UserId`]
//! where a [`CompanyId`] is expected.
//!
//! All identifiers are UUID-backed and always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a UUID-backed identifier newtype with the standard
/// constructor/accessor/conversion surface. Every identifier in the
/// platform goes through this macro so they all behave identically.
macro_rules! uuid_identifier {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

uuid_identifier! {
    /// A unique identifier for a tenant — the top-level account that
    /// owns a set of companies.
    TenantId
}

uuid_identifier! {
    /// A unique identifier for a user profile.
    UserId
}

uuid_identifier! {
    /// A unique identifier for a company undergoing onboarding.
    CompanyId
}

uuid_identifier! {
    /// A unique identifier for one company review cycle.
    ReviewId
}
