//! Group and roster configuration loading from config.toml
//!
//! This module provides functionality to load the initial group and its member
//! roster from a TOML configuration file. The roster defined in config.toml is
//! used to seed the database on first run; seeding is idempotent, so restarting
//! against an already-seeded store changes nothing.

use crate::entities::{Member, group, member};
use crate::errors::{Error, Result};
use sea_orm::{DatabaseConnection, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// The group this device manages
    pub group: GroupConfig,
    /// Initial member roster to seed
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

/// Configuration for the group itself
#[derive(Debug, Deserialize)]
pub struct GroupConfig {
    /// Name of the group
    pub name: String,
}

/// Configuration for a single roster member
#[derive(Debug, Deserialize, Clone)]
pub struct MemberConfig {
    /// Full name of the member
    pub name: String,
    /// Phone number, unique within the group
    pub phone: String,
}

/// Loads group configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Returns
/// * `Ok(Config)` - Successfully parsed configuration
/// * `Err(Error)` - Failed to read or parse the configuration file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads group configuration from the `CHAMA_CONFIG` path, falling back to
/// ./config.toml when the variable is unset.
///
/// # Returns
/// * `Ok(Config)` - Successfully parsed configuration
/// * `Err(Error)` - Failed to read or parse the configuration file
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CHAMA_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

/// Seeds the configured group and its roster into the database.
///
/// Looks the group up by name and creates it if missing, then registers each
/// configured member. Members whose phone number is already registered in the
/// group are skipped, so running this on every startup is safe.
pub async fn seed_initial_group(db: &DatabaseConnection, config: &Config) -> Result<group::Model> {
    info!(
        "Seeding group '{}' with {} configured members",
        config.group.name,
        config.members.len()
    );

    let group = match crate::core::group::get_group_by_name(db, &config.group.name).await? {
        Some(existing) => existing,
        None => crate::core::group::create_group(db, config.group.name.clone()).await?,
    };

    let mut registered = 0usize;
    let mut skipped = 0usize;
    for member_config in &config.members {
        let existing = Member::find()
            .filter(member::Column::GroupId.eq(group.id))
            .filter(member::Column::PhoneNumber.eq(member_config.phone.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            skipped += 1;
            continue;
        }

        crate::core::member::register_member(
            db,
            group.id,
            member_config.name.clone(),
            member_config.phone.clone(),
        )
        .await?;
        registered += 1;
    }

    info!(
        "Finished seeding '{}': {} members registered, {} already present",
        group.name, registered, skipped
    );

    Ok(group)
}
