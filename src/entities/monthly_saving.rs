//! Monthly saving entity - One group savings bucket per cycle and month.
//!
//! Keyed by the `MM/yyyy` month string; at most one bucket exists per
//! (cycle, month) pair. `actual_amount` is the denormalized sum of the
//! bucket's entries, recomputed inside the transaction of every entry insert.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly savings bucket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_savings")]
pub struct Model {
    /// Unique identifier for the bucket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Cycle this bucket belongs to
    pub cycle_id: i64,
    /// Group the cycle belongs to (denormalized for roster queries)
    pub group_id: i64,
    /// Calendar month key in `MM/yyyy` form (e.g., `"03/2025"`)
    pub month_year: String,
    /// Target amount, copied from the cycle's monthly target at creation
    pub target_amount: i64,
    /// Sum of all entries in the bucket (denormalized)
    pub actual_amount: i64,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between `MonthlySaving` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bucket belongs to one cycle
    #[sea_orm(
        belongs_to = "super::cycle::Entity",
        from = "Column::CycleId",
        to = "super::cycle::Column::Id"
    )]
    Cycle,
    /// One bucket has many member entries
    #[sea_orm(has_many = "super::monthly_saving_entry::Entity")]
    Entries,
}

impl Related<super::cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cycle.def()
    }
}

impl Related<super::monthly_saving_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
