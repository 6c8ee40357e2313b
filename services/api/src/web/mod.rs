pub mod envelope;
pub mod protocol;
pub mod reply_task;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server router.
pub use rest::{
    close_widget_handler, deliver_reply_handler, get_widget_handler, open_widget_handler,
    send_message_handler, set_language_handler, toggle_widget_handler,
};
pub use ws_handler::ws_handler;

/// The widget routes, without CORS or the Swagger UI.
pub fn widget_routes(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/widget", get(get_widget_handler))
        .route("/widget/open", post(open_widget_handler))
        .route("/widget/close", post(close_widget_handler))
        .route("/widget/toggle", post(toggle_widget_handler))
        .route("/widget/messages", post(send_message_handler))
        .route("/widget/language", put(set_language_handler))
        .route("/widget/replies", post(deliver_reply_handler))
        .route("/widget/ws", get(ws_handler))
        .with_state(app_state)
}

/// The complete application: widget routes behind CORS, plus the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    Ok(Router::new()
        .merge(widget_routes(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
