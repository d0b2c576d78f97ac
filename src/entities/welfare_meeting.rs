//! Welfare meeting entity - One ad-hoc welfare collection.
//!
//! Welfare runs outside the cycle machinery: amounts are caller-chosen and
//! `contributor_names` is a display-only denormalization; the authoritative
//! data stays in the welfare contribution rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Welfare meeting database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "welfare_meetings")]
pub struct Model {
    /// Unique identifier for the welfare meeting
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group that held the collection
    pub group_id: i64,
    /// Calendar day of the collection
    pub date: Date,
    /// Sum of the meeting's positive contribution amounts (denormalized)
    pub total_collected: i64,
    /// Comma-joined contributor display names, for list screens
    pub contributor_names: String,
    /// Identity of whoever recorded the meeting, if known
    pub recorded_by: Option<String>,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between `WelfareMeeting` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each welfare meeting belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// One welfare meeting has many contribution rows
    #[sea_orm(has_many = "super::welfare_contribution::Entity")]
    Contributions,
    /// One welfare meeting has many beneficiary rows
    #[sea_orm(has_many = "super::welfare_beneficiary::Entity")]
    Beneficiaries,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::welfare_contribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contributions.def()
    }
}

impl Related<super::welfare_beneficiary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
