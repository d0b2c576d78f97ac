//! Member entity - One person on a group's roster.
//!
//! Members are never hard-deleted; leaving the group flips the `active`
//! flag so historical contribution and payout rows keep their references.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Unique identifier for the member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Group this member belongs to
    pub group_id: i64,
    /// Display name
    pub name: String,
    /// Phone number, unique within the group (enforced at registration)
    pub phone_number: String,
    /// Whether the member currently participates in meetings and rotations
    pub is_active: bool,
    /// When the member joined the group
    pub joined_at: DateTimeUtc,
    /// When any field of this row last changed
    pub updated_at: DateTimeUtc,
    /// Whether this row has been pushed to the remote store
    pub synced: bool,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each member belongs to one group
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id"
    )]
    Group,
    /// One member has many weekly contributions
    #[sea_orm(has_many = "super::contribution::Entity")]
    Contributions,
    /// One member has many payout records
    #[sea_orm(has_many = "super::beneficiary::Entity")]
    Beneficiaries,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
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
