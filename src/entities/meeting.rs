//! Meeting entity - One weekly gathering within a cycle.
//!
//! `total_collected` is derived state, recomputed inside the same transaction
//! as every contribution change. Several meetings on the same date are legal;
//! the app deliberately performs no date-uniqueness validation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly meeting database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_meetings")]
pub struct Model {
    /// Unique identifier for the meeting
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Cycle this meeting belongs to
    pub cycle_id: i64,
    /// Group the cycle belongs to (denormalized for roster queries)
    pub group_id: i64,
    /// Calendar day the meeting was held
    pub date: Date,
    /// Sum of the meeting's contribution rows (denormalized)
    pub total_collected: i64,
    /// Identity of whoever recorded the meeting, if known
    pub recorded_by: Option<String>,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Meeting and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each meeting belongs to one cycle
    #[sea_orm(
        belongs_to = "super::cycle::Entity",
        from = "Column::CycleId",
        to = "super::cycle::Column::Id"
    )]
    Cycle,
    /// One meeting has many contribution rows
    #[sea_orm(has_many = "super::contribution::Entity")]
    Contributions,
    /// One meeting has many beneficiary rows
    #[sea_orm(has_many = "super::beneficiary::Entity")]
    Beneficiaries,
}

impl Related<super::cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cycle.def()
    }
}

impl Related<super::contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl Related<super::beneficiary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
