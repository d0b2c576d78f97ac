//! App state entity - Key-value pairs that survive restarts.
//!
//! Holds the schema version, the last successful sync timestamp, and the
//! current session's user id. Rows here never leave the device.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// App state database model - stores key-value configuration pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// State key (e.g., `"last_sync_time"`)
    pub key: String,
    /// State value stored as a string
    pub value: String,
    /// When this value was last modified
    pub updated_at: DateTimeUtc,
}

/// `AppState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
