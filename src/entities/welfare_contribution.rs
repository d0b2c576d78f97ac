//! Welfare contribution entity - One member's payment into a welfare pot.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Welfare contribution database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_welfare_contributions")]
pub struct Model {
    /// Unique identifier for the contribution
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Welfare meeting this contribution was collected at
    pub meeting_id: i64,
    /// Member who paid
    pub member_id: i64,
    /// Caller-chosen amount, always positive
    pub amount: i64,
    /// When the contribution was recorded
    pub contributed_at: DateTimeUtc,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between `WelfareContribution` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each contribution belongs to one welfare meeting
    #[sea_orm(
        belongs_to = "super::welfare_meeting::Entity",
        from = "Column::MeetingId",
        to = "super::welfare_meeting::Column::Id"
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
