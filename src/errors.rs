//! Unified error types and result handling.
//!
//! Every repository operation returns [`Result`]; failures are typed so callers
//! can distinguish missing rows from rule violations from storage faults
//! without string matching. Nothing in this crate panics on a failed
//! operation.

use thiserror::Error;

/// All failure modes surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or parsing failed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// A business rule was violated (duplicate phone, malformed month key,
    /// member outside the group, ...).
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the violated rule
        message: String,
    },

    /// An amount was zero or negative where a positive amount is required.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: i64,
    },

    /// A beneficiary selection exceeded the cycle's per-meeting quota.
    #[error("Too many beneficiaries: {selected} selected, quota is {quota}")]
    TooManyBeneficiaries {
        /// How many members the caller supplied
        selected: usize,
        /// The cycle's beneficiaries-per-meeting quota
        quota: i32,
    },

    /// A member was selected who already received a payout in the cycle.
    #[error("Member {member_id} already received a payout in this cycle")]
    AlreadyBeneficiary {
        /// The ineligible member
        member_id: i64,
    },

    /// No group row with this id.
    #[error("Group {id} not found")]
    GroupNotFound {
        /// The missing group id
        id: i64,
    },

    /// No member row with this id.
    #[error("Member {id} not found")]
    MemberNotFound {
        /// The missing member id
        id: i64,
    },

    /// No cycle row with this id.
    #[error("Cycle {id} not found")]
    CycleNotFound {
        /// The missing cycle id
        id: i64,
    },

    /// No weekly meeting row with this id.
    #[error("Meeting {id} not found")]
    MeetingNotFound {
        /// The missing meeting id
        id: i64,
    },

    /// No welfare meeting row with this id.
    #[error("Welfare meeting {id} not found")]
    WelfareMeetingNotFound {
        /// The missing welfare meeting id
        id: i64,
    },

    /// No monthly savings bucket for the (cycle, month) pair.
    #[error("No savings bucket for cycle {cycle_id} in {month_year}")]
    SavingNotFound {
        /// Cycle the bucket was looked up under
        cycle_id: i64,
        /// Month key in `MM/yyyy` form
        month_year: String,
    },

    /// Storage-layer failure, wrapped so callers have one error channel.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Document (de)serialization failure in the sync layer.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}
