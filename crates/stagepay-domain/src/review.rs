//! # Company Review State Machine
//!
//! One [`CompanyReview`] record represents one submission cycle:
//!
//! ```text
//! (none) ──submit──▶ Pending ──approve──▶ Approved (terminal)
//!                       │
//!                       └────reject────▶ Rejected (terminal)
//! ```
//!
//! Both outcomes are terminal for the record. A rejected company may
//! resubmit; the gate replaces the rejected record with a fresh pending
//! one rather than reopening it, so terminal states stay terminal.
//!
//! The transitions here enforce only state-machine preconditions (the
//! review must be pending; rejection needs a reason). Completeness gating
//! and authorization are the caller's responsibility — see
//! [`crate::completeness`] and the API layer's policy checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stagepay_core::{CompanyId, ReviewId, UserId};

/// Status of a review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    /// Stable lowercase name, matching the wire and database encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Whether this status permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-machine precondition failure on a review transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// The review has already reached a terminal state.
    #[error("review is {status}, not pending")]
    NotPending {
        /// The review's current status.
        status: ReviewStatus,
    },

    /// Rejection without a stated reason is a client error.
    #[error("review notes are required to reject")]
    NotesRequired,
}

/// One submission-for-approval cycle for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReview {
    pub id: ReviewId,
    pub company_id: CompanyId,
    pub status: ReviewStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

impl CompanyReview {
    /// Open a fresh pending review cycle.
    pub fn new_pending(company_id: CompanyId, now: DateTime<Utc>) -> Self {
        Self {
            id: ReviewId::new(),
            company_id,
            status: ReviewStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        }
    }

    fn require_pending(&self) -> Result<(), ReviewError> {
        if self.status != ReviewStatus::Pending {
            return Err(ReviewError::NotPending {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Transition `pending → approved`, recording the reviewer, the
    /// decision time, and optional notes.
    pub fn approve(
        &mut self,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewError> {
        self.require_pending()?;
        self.status = ReviewStatus::Approved;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
        Ok(())
    }

    /// Transition `pending → rejected`. Notes are mandatory: a company
    /// admin must be able to see why their submission came back.
    pub fn reject(
        &mut self,
        reviewer: UserId,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ReviewError> {
        if notes.trim().is_empty() {
            return Err(ReviewError::NotesRequired);
        }
        self.require_pending()?;
        self.status = ReviewStatus::Rejected;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = Some(notes.to_string());
        Ok(())
    }
}
