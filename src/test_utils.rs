//! Shared test utilities for `ChamaLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{cycle, group, meeting, member},
    entities,
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test group with a fixed name.
pub async fn create_test_group(db: &DatabaseConnection) -> Result<entities::group::Model> {
    group::create_group(db, "Test Chama".to_string()).await
}

/// Registers a test member in the given group.
pub async fn create_test_member(
    db: &DatabaseConnection,
    group_id: i64,
    name: &str,
    phone: &str,
) -> Result<entities::member::Model> {
    member::register_member(db, group_id, name.to_string(), phone.to_string()).await
}

/// Registers `count` members named "Member 01", "Member 02", ... with
/// unique phone numbers. Returns them in registration (and name) order.
pub async fn create_test_roster(
    db: &DatabaseConnection,
    group_id: i64,
    count: usize,
) -> Result<Vec<entities::member::Model>> {
    let mut members = Vec::with_capacity(count);
    for i in 1..=count {
        let m = create_test_member(
            db,
            group_id,
            &format!("Member {i:02}"),
            &format!("07001000{i:02}"),
        )
        .await?;
        members.push(m);
    }
    Ok(members)
}

/// Starts a test cycle with sensible defaults.
///
/// # Defaults
/// * `weekly_amount`: 200
/// * `monthly_target`: 500
/// * `beneficiaries_per_meeting`: 2
/// * `total_members`: the group's current active member count
/// * `start_date`: now
pub async fn create_test_cycle(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<entities::cycle::Model> {
    let total_members = member::count_active_members(db, group_id).await? as i32;
    cycle::start_new_cycle(db, group_id, 200, 500, total_members, Utc::now(), 2).await
}

/// Creates a test meeting dated today, recorded by "admin".
pub async fn create_test_meeting(
    db: &DatabaseConnection,
    cycle_id: i64,
) -> Result<entities::meeting::Model> {
    meeting::create_weekly_meeting(
        db,
        cycle_id,
        Utc::now().date_naive(),
        Some("admin".to_string()),
    )
    .await
}

/// Sets up a complete test environment with a group and an active cycle.
/// Returns (db, group, cycle) for common test scenarios.
pub async fn setup_with_cycle() -> Result<(
    DatabaseConnection,
    entities::group::Model,
    entities::cycle::Model,
)> {
    let db = setup_test_db().await?;
    let group = create_test_group(&db).await?;
    let cycle = create_test_cycle(&db, group.id).await?;
    Ok((db, group, cycle))
}

/// Sets up a group with `count` registered members and an active cycle.
/// Returns (db, group, cycle, members) for rotation and ledger tests.
pub async fn setup_with_roster(
    count: usize,
) -> Result<(
    DatabaseConnection,
    entities::group::Model,
    entities::cycle::Model,
    Vec<entities::member::Model>,
)> {
    let db = setup_test_db().await?;
    let group = create_test_group(&db).await?;
    let members = create_test_roster(&db, group.id, count).await?;
    let cycle = create_test_cycle(&db, group.id).await?;
    Ok((db, group, cycle, members))
}
