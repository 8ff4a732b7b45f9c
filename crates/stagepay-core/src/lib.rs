//! # stagepay-core — Foundational Types for the StagePay Platform
//!
//! The leaf crate of the workspace. Defines the type-system primitives the
//! rest of the platform is built on: identifier newtypes, the caller role
//! model, and explicit record lifecycle state.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `TenantId`, `UserId`,
//!    `CompanyId`, `ReviewId` — one distinct type per aggregate. You cannot
//!    pass a `UserId` where a `CompanyId` is expected. No bare UUIDs.
//!
//! 2. **Single `Role` enum.** Authorization decisions exhaustively match on
//!    one definition. Adding a role forces every policy check to handle it.
//!
//! 3. **Explicit lifecycle state.** Records are `Active` or
//!    `Discarded { at }` — a real enum, not a nullable timestamp column
//!    with implicit default-scope filtering. Every query path names the
//!    lifecycle it wants.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `stagepay-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod identity;
pub mod lifecycle;
pub mod role;

pub use identity::{CompanyId, ReviewId, TenantId, UserId};
pub use lifecycle::Lifecycle;
pub use role::Role;
