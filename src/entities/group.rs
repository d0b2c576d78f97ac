//! Group entity - One chama (rotating-savings group).
//!
//! Members, cycles, meetings, and welfare funds all hang off a group.
//! The engine itself is multi-group capable even though a single device
//! typically manages one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable group name (e.g., "Umoja Women Group")
    pub name: String,
    /// When the group was created
    pub created_at: DateTimeUtc,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Group and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group has many members
    #[sea_orm(has_many = "super::member::Entity")]
    Members,
    /// One group has many savings cycles
    #[sea_orm(has_many = "super::cycle::Entity")]
    Cycles,
    /// One group has many welfare meetings
    #[sea_orm(has_many = "super::welfare_meeting::Entity")]
    WelfareMeetings,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cycles.def()
    }
}

impl Related<super::welfare_meeting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WelfareMeetings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
