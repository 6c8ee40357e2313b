//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{HttpReplyAdapter, JsonFilePersistence, SystemClock},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use chat_widget_core::{ReplyService, RestoreOutcome, WidgetStateMachine};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Restore the Widget ---
    info!("Loading widget snapshot from {}", config.state_path.display());
    let persistence = Arc::new(JsonFilePersistence::new(config.state_path.clone()));
    let widget =
        WidgetStateMachine::restore(config.widget_config(), persistence, Arc::new(SystemClock))
            .await;
    match widget.restore_outcome() {
        RestoreOutcome::LoadFailed(reason) => {
            warn!("Widget snapshot could not be loaded, continuing in memory: {}", reason)
        }
        outcome => info!("Widget ready ({:?})", outcome),
    }

    // --- 3. Initialize the Optional Reply Upstream ---
    let reply_service: Option<Arc<dyn ReplyService>> = match &config.chat_upstream_url {
        Some(url) => {
            info!("Assistant replies will be requested from {}", url);
            Some(Arc::new(HttpReplyAdapter::new(reqwest::Client::new(), url.clone())))
        }
        None => {
            info!("No reply upstream configured; replies must be posted to /widget/replies");
            None
        }
    };

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(widget, config.clone(), reply_service));
    let app = build_router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
