use chamaledger::errors::Result;
use chamaledger::{config, core, sync};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok();

    // 3. Open the local store and bring the schema up to date
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::ensure_schema(&db)
        .await
        .inspect_err(|e| error!("Failed to prepare database schema: {}", e))?;

    // 4. Seed the configured group and roster when a config file is present
    match config::groups::load_default_config() {
        Ok(group_config) => {
            config::groups::seed_initial_group(&db, &group_config).await?;
        }
        Err(e) => {
            warn!("No usable config.toml, skipping roster seeding: {}", e);
        }
    }

    // 5. Report where the ledger stands
    for group in core::group::get_all_groups(&db).await? {
        let active_members = core::member::count_active_members(&db, group.id).await?;
        match core::cycle::get_active_cycle(&db, group.id).await? {
            Some(cycle) => info!(
                "Group '{}': {} active members, cycle running since {}, total saved {}",
                group.name,
                active_members,
                cycle.start_date.format("%Y-%m-%d"),
                cycle.total_saved
            ),
            None => info!(
                "Group '{}': {} active members, no active cycle",
                group.name, active_members
            ),
        }
    }
    match sync::last_sync_time(&db).await? {
        Some(at) => info!("Last successful sync pass: {}", at.format("%Y-%m-%d %H:%M:%S")),
        None => info!("No sync pass recorded yet."),
    }

    Ok(())
}
