//! Welfare beneficiary entity - One welfare payout to a member.
//!
//! Unlike cycle payouts there is no exclusivity: the same member may benefit
//! from any number of welfare meetings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Welfare beneficiary database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "welfare_beneficiaries")]
pub struct Model {
    /// Unique identifier for the payout record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Welfare meeting the payout happened at
    pub meeting_id: i64,
    /// Member who received the payout
    pub member_id: i64,
    /// Equal share of the pot: floor(total collected / beneficiary count)
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

/// Defines relationships between `WelfareBeneficiary` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payout belongs to one welfare meeting
    #[sea_orm(
        belongs_to = "super::welfare_meeting::Entity",
        from = "Column::MeetingId",
        to = "super::welfare_meeting::Column::Id"
    )]
    Meeting,
    /// Each payout belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::welfare_meeting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meeting.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
