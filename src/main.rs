use dotenvy::dotenv;
use trade_journal::{
    api::{self, AppState},
    config::{self, database},
    errors::Result,
    scheduler,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Background housekeeping
    let housekeeping = app_config
        .scheduler
        .enabled
        .then(|| scheduler::spawn_housekeeping(db.clone(), app_config.scheduler.interval()));
    if housekeeping.is_none() {
        info!("Housekeeping scheduler disabled; drive it through the HTTP functions.");
    }

    // 6. Serve the API until Ctrl-C
    let bind_addr = app_config.server.bind_addr.clone();
    let state = AppState::new(db, app_config)?;
    let served = api::serve(state, &bind_addr).await;

    if let Some(handle) = housekeeping {
        handle.abort();
    }
    served
}
