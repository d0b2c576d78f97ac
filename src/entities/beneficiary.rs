//! Beneficiary entity - Records that a member received a payout.
//!
//! The core rotation rule lives on this table: a member may appear at most
//! once per cycle, and a meeting may carry at most the cycle's
//! beneficiaries-per-meeting quota. Both rules are enforced by
//! [`crate::core::beneficiary::select_beneficiaries`] before rows are written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Beneficiary database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "beneficiaries")]
pub struct Model {
    /// Unique identifier for the payout record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Meeting the payout happened at
    pub meeting_id: i64,
    /// Cycle the meeting belongs to (denormalized for the exclusivity query)
    pub cycle_id: i64,
    /// Member who received the payout
    pub member_id: i64,
    /// Amount handed over; the owning cycle's weekly amount
    pub amount_received: i64,
    /// 1-based rank among the meeting's beneficiaries, in selection order
    pub payment_order: i32,
    /// When the payout was awarded
    pub awarded_at: DateTimeUtc,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Beneficiary and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payout belongs to one meeting
    #[sea_orm(
        belongs_to = "super::meeting::Entity",
        from = "Column::MeetingId",
        to = "super::meeting::Column::Id"
    )]
    Meeting,
    /// Each payout belongs to one cycle
    #[sea_orm(
        belongs_to = "super::cycle::Entity",
        from = "Column::CycleId",
        to = "super::cycle::Column::Id"
    )]
    Cycle,
    /// Each payout belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::meeting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meeting.def()
    }
}

impl Related<super::cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cycle.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
