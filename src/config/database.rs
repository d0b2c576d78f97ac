//! Database configuration module for `ChamaLedger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the database schema
//! always matches the Rust entity definitions without manual SQL. A schema version is
//! stored in the `app_state` table; when the stored version no longer matches
//! [`SCHEMA_VERSION`] the store is dropped and rebuilt from the entities. Device data
//! is replaceable from the remote store, so a destructive rebuild is acceptable here.

use crate::entities::{
    AppState, Beneficiary, Contribution, Cycle, Group, Meeting, Member, MonthlySaving,
    MonthlySavingEntry, WelfareBeneficiary, WelfareContribution, WelfareMeeting,
};
use crate::errors::Result;
use sea_orm::sea_query::Table;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityName, Schema};
use tracing::warn;

/// Version of the on-disk table layout. Bump this whenever an entity changes shape;
/// existing stores are then rebuilt on the next startup.
pub const SCHEMA_VERSION: &str = "1";

/// `app_state` key the current schema version is stored under.
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
pub fn get_database_url() -> Result<String> {
    Ok(std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/chamaledger.sqlite?mode=rwc".to_string()))
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
/// This function handles connection errors and provides a clean interface for database access
/// throughout the application.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all database tables from the entity definitions.
///
/// Uses `CREATE TABLE IF NOT EXISTS`, so calling this against an existing store is a
/// no-op. Tables are created parents before children so the generated foreign keys
/// resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = vec![
        schema.create_table_from_entity(Group),
        schema.create_table_from_entity(Member),
        schema.create_table_from_entity(Cycle),
        schema.create_table_from_entity(Meeting),
        schema.create_table_from_entity(Contribution),
        schema.create_table_from_entity(Beneficiary),
        schema.create_table_from_entity(MonthlySaving),
        schema.create_table_from_entity(MonthlySavingEntry),
        schema.create_table_from_entity(WelfareMeeting),
        schema.create_table_from_entity(WelfareContribution),
        schema.create_table_from_entity(WelfareBeneficiary),
        schema.create_table_from_entity(AppState),
    ];

    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(table)).await?;
    }

    Ok(())
}

/// Drops every application table. Children go first so foreign keys never block a drop.
async fn drop_all_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();

    let tables = vec![
        Table::drop()
            .table(WelfareBeneficiary.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(WelfareContribution.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(WelfareMeeting.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(MonthlySavingEntry.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(MonthlySaving.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(Beneficiary.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop()
            .table(Contribution.table_ref())
            .if_exists()
            .to_owned(),
        Table::drop().table(Meeting.table_ref()).if_exists().to_owned(),
        Table::drop().table(Cycle.table_ref()).if_exists().to_owned(),
        Table::drop().table(Member.table_ref()).if_exists().to_owned(),
        Table::drop().table(Group.table_ref()).if_exists().to_owned(),
        Table::drop().table(AppState.table_ref()).if_exists().to_owned(),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    Ok(())
}

/// Brings the store up to the current schema.
///
/// Creates any missing tables, then compares the stored schema version against
/// [`SCHEMA_VERSION`]. A fresh store just gets stamped; a store written by a
/// different version is dropped and recreated before stamping.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    create_tables(db).await?;

    let stored = crate::core::state::get_value(db, SCHEMA_VERSION_KEY).await?;
    match stored.as_deref() {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(version) => {
            warn!(
                "Schema version changed ({} -> {}), dropping and rebuilding local store",
                version, SCHEMA_VERSION
            );
            drop_all_tables(db).await?;
            create_tables(db).await?;
            crate::core::state::set_value(db, SCHEMA_VERSION_KEY, SCHEMA_VERSION).await?;
            Ok(())
        }
        None => {
            crate::core::state::set_value(db, SCHEMA_VERSION_KEY, SCHEMA_VERSION).await?;
            Ok(())
        }
    }
}
