//! Core business logic - framework-agnostic chama operations.
//!
//! Each submodule owns one slice of the domain and exposes free async
//! functions over a SeaORM connection. Multi-step mutations open their own
//! transaction; helpers meant to run inside a caller's transaction are
//! generic over `ConnectionTrait`.

/// Beneficiary rotation engine - eligibility and payout selection
pub mod beneficiary;
/// Cycle lifecycle - start/end cycles and cycle statistics
pub mod cycle;
/// Group creation and lookups
pub mod group;
/// Weekly meetings and the contribution ledger
pub mod meeting;
/// Member registration and roster queries
pub mod member;
/// Cycle reporting and plain-text summaries
pub mod report;
/// Monthly savings buckets, entries, and calendar rollover
pub mod savings;
/// Key-value app state persisted across restarts
pub mod state;
/// Welfare meetings - the rotation-free analog of the weekly ledger
pub mod welfare;
