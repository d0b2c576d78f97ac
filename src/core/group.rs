//! Group business logic.
//!
//! Groups are the root of the data model; everything else references one.
//! Creation is the only mutation - groups are never renamed or deleted by
//! the engine.

use crate::{
    entities::{Group, group},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Creates a new group, validating that the name is not empty.
pub async fn create_group(db: &DatabaseConnection, name: String) -> Result<group::Model> {
    if name.trim().is_empty() {
        return Err(Error::validation("Group name cannot be empty"));
    }

    let now = Utc::now();
    let new_group = group::ActiveModel {
        name: Set(name.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        synced: Set(false),
        ..Default::default()
    };

    new_group.insert(db).await.map_err(Into::into)
}

/// Finds a group by its unique ID.
pub async fn get_group_by_id(db: &DatabaseConnection, group_id: i64) -> Result<Option<group::Model>> {
    Group::find_by_id(group_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a group by its exact name.
///
/// Used by the seeding path to keep first-run initialization idempotent.
pub async fn get_group_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<group::Model>> {
    Group::find()
        .filter(group::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all groups, ordered alphabetically by name.
pub async fn get_all_groups(db: &DatabaseConnection) -> Result<Vec<group::Model>> {
    Group::find()
        .order_by_asc(group::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
