//! Cycle entity - One rotation period for a group.
//!
//! A cycle fixes the weekly contribution amount, the monthly savings target,
//! and how many beneficiaries are paid out per meeting. At most one cycle per
//! group is active (no end date) at any time; the cycle operations in
//! [`crate::core::cycle`] maintain that invariant.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cycle database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cycles")]
pub struct Model {
    /// Unique identifier for the cycle
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group this cycle belongs to
    pub group_id: i64,
    /// When the cycle started
    pub start_date: DateTimeUtc,
    /// When the cycle ended; None while the cycle is active
    pub end_date: Option<DateTimeUtc>,
    /// Whether this is the group's current cycle
    pub is_active: bool,
    /// Fixed contribution amount per member per weekly meeting
    pub weekly_amount: i64,
    /// Savings target per monthly bucket
    pub monthly_target: i64,
    /// How many members receive a payout at each meeting
    pub beneficiaries_per_meeting: i32,
    /// Number of members enrolled when the cycle started
    pub total_members: i32,
    /// Running total collected across the cycle's meetings (denormalized)
    pub total_saved: i64,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Cycle and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each cycle belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// One cycle has many weekly meetings
    #[sea_orm(has_many = "super::meeting::Entity")]
    Meetings,
    /// One cycle has many monthly savings buckets
    #[sea_orm(has_many = "super::monthly_saving::Entity")]
    MonthlySavings,
    /// One cycle has many payout records
    #[sea_orm(has_many = "super::beneficiary::Entity")]
    Beneficiaries,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::meeting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meetings.def()
    }
}

impl Related<super::monthly_saving::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlySavings.def()
    }
}

impl Related<super::beneficiary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
