/// Database connection, schema creation, and schema-version migration
pub mod database;

/// Group and member roster seeding from config.toml
pub mod groups;
