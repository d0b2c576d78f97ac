//! Key-value app state.
//!
//! Thin get/set helpers over the `app_state` table. Writers upsert by key so
//! each key holds exactly one row. Callers that need the state change to be
//! atomic with other writes pass their own transaction.

use crate::{
    entities::{AppState, app_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Set, prelude::*};

/// Reads the value stored under `key`, if any.
pub async fn get_value<C>(conn: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let row = AppState::find()
        .filter(app_state::Column::Key.eq(key))
        .one(conn)
        .await?;

    Ok(row.map(|r| r.value))
}

/// Stores `value` under `key`, replacing any previous value.
pub async fn set_value<C>(conn: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let existing = AppState::find()
        .filter(app_state::Column::Key.eq(key))
        .one(conn)
        .await?;

    if let Some(state) = existing {
        let mut active_model: app_state::ActiveModel = state.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(conn).await?;
    } else {
        let new_state = app_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(conn).await?;
    }

    Ok(())
}
