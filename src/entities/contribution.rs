//! Contribution entity - One member's weekly payment at one meeting.
//!
//! At most one row exists per (meeting, member) pair: recording replaces the
//! meeting's whole contribution set rather than upserting row by row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly contribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_contributions")]
pub struct Model {
    /// Unique identifier for the contribution
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Meeting this contribution was collected at
    pub meeting_id: i64,
    /// Member who paid
    pub member_id: i64,
    /// Amount paid; always the owning cycle's weekly amount
    pub amount: i64,
    /// When the contribution was recorded
    pub contributed_at: DateTimeUtc,
    /// True when the contribution was recorded after the meeting day
    pub is_late: bool,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Contribution and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each contribution belongs to one meeting
    #[sea_orm(
        belongs_to = "super::meeting::Entity",
        from = "Column::MeetingId",
        to = "super::meeting::Column::Id"
    )]
    Meeting,
    /// Each contribution belongs to one member
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

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
