//! # Record Lifecycle State
//!
//! Tenants, user profiles, and companies are never hard-deleted; they move
//! to a `Discarded` state and stay out of active listings. The lifecycle is
//! an explicit enum rather than a nullable `discarded_at` column: callers
//! that list records must say which lifecycle they want, there is no
//! implicit default scope to forget about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a soft-deletable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    /// The record is live and participates in normal operations.
    Active,
    /// The record was discarded at the given instant. Discarded records
    /// are excluded from active listings and may not be mutated.
    Discarded {
        /// When the record was discarded.
        at: DateTime<Utc>,
    },
}

impl Lifecycle {
    /// `true` when the record is live.
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// `true` when the record has been discarded.
    pub fn is_discarded(&self) -> bool {
        !self.is_active()
    }

    /// Transition to `Discarded` at the given instant. Discarding an
    /// already-discarded record keeps the original timestamp.
    pub fn discard(&mut self, at: DateTime<Utc>) {
        if self.is_active() {
            *self = Lifecycle::Discarded { at };
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_active() {
        assert!(Lifecycle::default().is_active());
        assert!(!Lifecycle::default().is_discarded());
    }

    #[test]
    fn discard_records_timestamp() {
        let mut state = Lifecycle::Active;
        let at = Utc::now();
        state.discard(at);
        assert_eq!(state, Lifecycle::Discarded { at });
    }

    #[test]
    fn discard_is_idempotent_keeping_first_timestamp() {
        let mut state = Lifecycle::Active;
        let first = Utc::now();
        state.discard(first);
        state.discard(first + chrono::Duration::hours(1));
        assert_eq!(state, Lifecycle::Discarded { at: first });
    }

    #[test]
    fn lifecycle_serializes_with_tag() {
        let json = serde_json::to_value(Lifecycle::Active).unwrap();
        assert_eq!(json["state"], "active");
    }
}
