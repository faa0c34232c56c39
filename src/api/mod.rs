//! HTTP surface: one JSON handler per housekeeping or proxy function.
//!
//! All routes live under `/functions` (plus `/health`), answer with the
//! [`response::ApiResponse`] envelope and accept CORS preflight from any origin.

mod community;
mod market;
mod recurring;
/// Response envelope and error mapping
pub mod response;
mod trades;
mod trial;

use crate::{
    config::AppConfig,
    errors::Result,
    market::{AiGateway, CentralBankClient, QuoteClient},
};
use axum::{
    Router,
    extract::State,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Indicator series client
    pub central_bank: CentralBankClient,
    /// Quote client
    pub quotes: QuoteClient,
    /// AI gateway used for trade classification
    pub ai: AiGateway,
}

impl AppState {
    /// Builds the state, creating outbound clients from `config` and reading API
    /// keys from the environment.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self> {
        let central_bank =
            CentralBankClient::new(&config.market.central_bank_url, config.market.timeout())?;
        let quotes = QuoteClient::from_env(&config.market.quote_url, config.market.timeout())?;
        let ai = AiGateway::from_env(&config.ai.gateway_url, &config.ai.model, config.ai.timeout())?;
        if !ai.is_configured() {
            warn!("AI gateway key not set; trade classification is disabled");
        }
        Ok(Self {
            db,
            config: Arc::new(config),
            central_bank,
            quotes,
            ai,
        })
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ])
}

fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/process-recurring", post(recurring::process_recurring))
        .route("/import-recurring", post(recurring::import_recurring))
        .route("/recurring", get(recurring::list_recurring))
        .route("/recurring/:id/active", patch(recurring::set_recurring_active))
        .route("/bulk-delete-trades", post(trades::bulk_delete_trades))
        .route("/classify-trades", post(trades::classify_trades))
        .route("/start-trial", post(trial::start_trial))
        .route("/check-trial", post(trial::check_trial))
        .route("/expire-trials", post(trial::expire_trials))
        .route("/trending", get(community::trending))
        .route("/rankings", get(community::rankings))
        .route("/indicators/:series", get(market::indicators))
        .route("/quotes", get(market::quotes))
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/functions", function_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> response::ApiResult<Health> {
    response::ok(Health {
        status: "ok",
        database: state.db.ping().await.is_ok(),
    })
}

/// Serves the API on `bind_addr` until Ctrl-C.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
