//! Monthly saving entry entity - One member deposit toward a monthly bucket.
//!
//! A member may deposit any number of times into the same bucket; their
//! entries are summed when checking the per-member target.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly saving entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_saving_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Bucket this entry belongs to
    pub saving_id: i64,
    /// Member who deposited
    pub member_id: i64,
    /// Deposited amount
    pub amount: i64,
    /// When the deposit was made
    pub entry_date: DateTimeUtc,
    /// Identity of whoever recorded the deposit
    pub recorded_by: String,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between `MonthlySavingEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one bucket
    #[sea_orm(
        belongs_to = "super::monthly_saving::Entity",
        from = "Column::SavingId",
        to = "super::monthly_saving::Column::Id"
    )]
    Saving,
    /// Each entry belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::monthly_saving::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Saving.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
