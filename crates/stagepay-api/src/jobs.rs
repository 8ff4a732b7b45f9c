//! # Approval Fan-out
//!
//! When a review is approved, the synchronous path records the decision
//! and enqueues an [`ApprovalJob`]; a worker task propagates the
//! approval across the company aggregate asynchronously: the company's
//! `approved` flag plus the `approved` flag on each configuration
//! sub-record that exists, all under one store write lock (one SQL
//! transaction in Postgres mode).
//!
//! The queue is an in-process `tokio::sync::mpsc::unbounded` channel.
//! Retry and backoff are the queue host's concern, not this module's.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use stagepay_core::{CompanyId, ReviewId, UserId};

use crate::state::AppState;

/// A unit of fan-out work, dispatched when a review is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalJob {
    pub company_id: CompanyId,
    pub review_id: ReviewId,
    /// The reviewer whose decision is being propagated.
    pub approved_by: UserId,
}

/// Receiver half of the approval queue, consumed by the worker task.
pub type ApprovalReceiver = mpsc::UnboundedReceiver<ApprovalJob>;

/// Cloneable sender half of the approval queue, held in `AppState`.
#[derive(Debug, Clone)]
pub struct ApprovalQueue {
    sender: mpsc::UnboundedSender<ApprovalJob>,
}

impl ApprovalQueue {
    /// Create the queue, returning the sender wrapper and the receiver
    /// to hand to [`spawn_worker`].
    pub fn new() -> (Self, ApprovalReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueue a job. Send is synchronous (unbounded channel), so this
    /// can run inside a store write lock. Fails only if the worker side
    /// has been dropped.
    pub fn enqueue(&self, job: ApprovalJob) -> Result<(), ApprovalJob> {
        self.sender.send(job).map_err(|e| e.0)
    }
}

/// What a fan-out execution did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// Approval flags were set on the company and its sub-records.
    Applied,
    /// The company was already approved; nothing changed.
    AlreadyApproved,
    /// The company no longer exists; the job is dropped.
    CompanyMissing,
}

/// Apply the fan-out to the in-memory aggregate.
///
/// Single `try_update` closure: the already-approved check and the flag
/// writes happen under one write lock, so re-delivery of the same job
/// is a no-op.
pub fn apply_fanout(state: &AppState, job: &ApprovalJob) -> FanoutOutcome {
    let now = Utc::now();
    let result = state
        .companies
        .try_update(&job.company_id, |company| -> Result<FanoutOutcome, ()> {
            if company.approved {
                return Ok(FanoutOutcome::AlreadyApproved);
            }
            company.approved = true;
            company.approved_at = Some(now);
            company.approved_by = Some(job.approved_by);
            if let Some(bank) = company.bank_config.as_mut() {
                bank.approved = true;
            }
            if let Some(payroll) = company.payroll_config.as_mut() {
                payroll.approved = true;
            }
            if let Some(union) = company.union_config.as_mut() {
                union.approved = true;
            }
            company.updated_at = now;
            Ok(FanoutOutcome::Applied)
        });
    match result {
        Some(Ok(outcome)) => outcome,
        Some(Err(())) => unreachable!("fan-out closure never fails"),
        None => FanoutOutcome::CompanyMissing,
    }
}

/// Execute one approval job: in-memory fan-out, then (when a pool is
/// attached) the company document write and the job completion marker
/// in a single transaction.
pub async fn execute_fanout(state: &AppState, job: &ApprovalJob) -> Result<FanoutOutcome, sqlx::Error> {
    let outcome = apply_fanout(state, job);

    if let Some(pool) = &state.db_pool {
        match outcome {
            FanoutOutcome::Applied | FanoutOutcome::AlreadyApproved => {
                if let Some(company) = state.companies.get(&job.company_id) {
                    let mut tx = pool.begin().await?;
                    crate::db::companies::upsert(&mut *tx, &company).await?;
                    crate::db::reviews::mark_job_done(&mut *tx, job.review_id).await?;
                    tx.commit().await?;
                }
            }
            FanoutOutcome::CompanyMissing => {
                crate::db::reviews::mark_job_done(pool, job.review_id).await?;
            }
        }
    }

    Ok(outcome)
}

/// Spawn the worker task that drains the approval queue.
pub fn spawn_worker(state: AppState, mut receiver: ApprovalReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            match execute_fanout(&state, &job).await {
                Ok(outcome) => {
                    tracing::info!(
                        company_id = %job.company_id,
                        review_id = %job.review_id,
                        ?outcome,
                        "approval fan-out executed"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        company_id = %job.company_id,
                        review_id = %job.review_id,
                        error = %err,
                        "approval fan-out persistence failed"
                    );
                }
            }
        }
        tracing::info!("approval queue closed, worker exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stagepay_core::TenantId;
    use stagepay_domain::{
        AccountType, BankConfig, Company, PayFrequency, PayrollConfig, UnionConfig,
        UnionMembership,
    };

    fn seeded_company(state: &AppState, with_configs: bool) -> CompanyId {
        let now = Utc::now();
        let mut company = Company::new(
            TenantId::new(),
            state.operator_id,
            "Winter Garden".to_string(),
            "wg".to_string(),
            now,
        );
        if with_configs {
            company.bank_config = Some(BankConfig {
                bank_name: "Chase".to_string(),
                account_number: "12345678".to_string(),
                routing_number_ach: "021000021".to_string(),
                routing_number_wire: "021000021".to_string(),
                account_type: AccountType::Checking,
                authorized: true,
                active: true,
                approved: false,
            });
            company.payroll_config = Some(PayrollConfig {
                frequency: PayFrequency::Weekly,
                period: "monday".to_string(),
                start_date: now.date_naive(),
                check_start_number: 1000,
                active: true,
                approved: false,
            });
            company.union_config = Some(UnionConfig {
                membership: UnionMembership::NonUnion,
                active: true,
                approved: false,
            });
        }
        let id = company.id;
        state.companies.insert(id, company);
        id
    }

    fn job_for(company_id: CompanyId, approved_by: UserId) -> ApprovalJob {
        ApprovalJob {
            company_id,
            review_id: ReviewId::new(),
            approved_by,
        }
    }

    #[test]
    fn fanout_sets_company_and_config_flags() {
        let (state, _rx) = AppState::new();
        let company_id = seeded_company(&state, true);
        let reviewer = UserId::new();

        let outcome = apply_fanout(&state, &job_for(company_id, reviewer));
        assert_eq!(outcome, FanoutOutcome::Applied);

        let company = state.companies.get(&company_id).unwrap();
        assert!(company.approved);
        assert_eq!(company.approved_by, Some(reviewer));
        assert!(company.approved_at.is_some());
        assert!(company.bank_config.unwrap().approved);
        assert!(company.payroll_config.unwrap().approved);
        assert!(company.union_config.unwrap().approved);
    }

    #[test]
    fn fanout_skips_missing_sub_records() {
        let (state, _rx) = AppState::new();
        let company_id = seeded_company(&state, false);

        let outcome = apply_fanout(&state, &job_for(company_id, UserId::new()));
        assert_eq!(outcome, FanoutOutcome::Applied);

        let company = state.companies.get(&company_id).unwrap();
        assert!(company.approved);
        assert!(company.bank_config.is_none());
    }

    #[test]
    fn fanout_is_idempotent() {
        let (state, _rx) = AppState::new();
        let company_id = seeded_company(&state, true);
        let job = job_for(company_id, UserId::new());

        assert_eq!(apply_fanout(&state, &job), FanoutOutcome::Applied);
        let first = state.companies.get(&company_id).unwrap();

        assert_eq!(apply_fanout(&state, &job), FanoutOutcome::AlreadyApproved);
        let second = state.companies.get(&company_id).unwrap();
        assert_eq!(first.approved_at, second.approved_at);
        assert_eq!(first.approved_by, second.approved_by);
    }

    #[test]
    fn fanout_reports_missing_company() {
        let (state, _rx) = AppState::new();
        let outcome = apply_fanout(&state, &job_for(CompanyId::new(), UserId::new()));
        assert_eq!(outcome, FanoutOutcome::CompanyMissing);
    }

    #[tokio::test]
    async fn worker_drains_enqueued_jobs() {
        let (state, rx) = AppState::new();
        let company_id = seeded_company(&state, true);
        let handle = spawn_worker(state.clone(), rx);

        state
            .approval_jobs
            .enqueue(job_for(company_id, UserId::new()))
            .unwrap();

        // Unbounded channel, in-memory work: one yield round is enough
        // in practice, but poll briefly to avoid flakiness.
        for _ in 0..50 {
            if state.companies.get(&company_id).unwrap().approved {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(state.companies.get(&company_id).unwrap().approved);
        handle.abort();
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Re-running the fan-out any number of times leaves the
            /// aggregate exactly as one run does, regardless of which
            /// sub-records exist.
            #[test]
            fn repeated_fanout_equals_single_fanout(
                with_configs in any::<bool>(),
                extra_runs in 1usize..5,
            ) {
                let (state, _rx) = AppState::new();
                let company_id = seeded_company(&state, with_configs);
                let job = job_for(company_id, UserId::new());

                prop_assert_eq!(apply_fanout(&state, &job), FanoutOutcome::Applied);
                let after_one = state.companies.get(&company_id).unwrap();

                for _ in 0..extra_runs {
                    prop_assert_eq!(
                        apply_fanout(&state, &job),
                        FanoutOutcome::AlreadyApproved
                    );
                }
                let after_many = state.companies.get(&company_id).unwrap();
                prop_assert_eq!(after_one, after_many);
            }
        }
    }
}
