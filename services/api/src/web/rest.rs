//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the widget REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::envelope::{ApiResponse, ErrorBody, ErrorResponse};
use crate::web::reply_task::spawn_reply;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chat_widget_core::{Language, Message, MessagePart, WidgetState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_widget_handler,
        open_widget_handler,
        close_widget_handler,
        toggle_widget_handler,
        send_message_handler,
        set_language_handler,
        deliver_reply_handler,
    ),
    components(
        schemas(
            WidgetSnapshotResponse,
            SentMessageResponse,
            LanguageResponse,
            DeliveredReplyResponse,
            SendMessageRequest,
            SetLanguageRequest,
            DeliverReplyRequest,
            ErrorBody,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Chat Widget API", description = "Client state of the site's chat widget.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The full widget state plus the sends left in the current window.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshotResponse {
    #[schema(value_type = Object)]
    pub state: WidgetState,
    pub remaining_quota: u32,
}

/// The stored user message and the sends left afterwards.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentMessageResponse {
    #[schema(value_type = Object)]
    pub message: Message,
    pub remaining_quota: u32,
}

/// The assistant message as stored.
#[derive(Serialize, ToSchema)]
pub struct DeliveredReplyResponse {
    #[schema(value_type = Object)]
    pub message: Message,
}

#[derive(Serialize, ToSchema)]
pub struct LanguageResponse {
    pub code: String,
    pub label: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetLanguageRequest {
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeliverReplyRequest {
    pub text: String,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub parts: Option<Vec<MessagePart>>,
}

impl From<Language> for LanguageResponse {
    fn from(language: Language) -> Self {
        Self {
            code: language.code().to_string(),
            label: language.label().to_string(),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

async fn snapshot(app_state: &AppState) -> WidgetSnapshotResponse {
    let widget = app_state.widget.lock().await;
    WidgetSnapshotResponse {
        state: widget.snapshot().clone(),
        remaining_quota: widget.remaining_quota(),
    }
}

/// Read the current widget state.
#[utoipa::path(
    get,
    path = "/widget",
    responses(
        (status = 200, description = "Current widget state",
            body = ApiResponse<WidgetSnapshotResponse>)
    )
)]
pub async fn get_widget_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ApiResponse<WidgetSnapshotResponse>> {
    Json(ApiResponse::ok(snapshot(&app_state).await))
}

/// Show the widget panel.
#[utoipa::path(
    post,
    path = "/widget/open",
    responses(
        (status = 200, description = "Widget is open",
            body = ApiResponse<WidgetSnapshotResponse>),
        (status = 503, description = "Applied but not persisted", body = ErrorResponse)
    )
)]
pub async fn open_widget_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WidgetSnapshotResponse>>, ApiError> {
    app_state.widget.lock().await.open().await?;
    Ok(Json(ApiResponse::ok(snapshot(&app_state).await)))
}

/// Hide the widget panel. In-flight replies are not cancelled.
#[utoipa::path(
    post,
    path = "/widget/close",
    responses(
        (status = 200, description = "Widget is closed",
            body = ApiResponse<WidgetSnapshotResponse>),
        (status = 503, description = "Applied but not persisted", body = ErrorResponse)
    )
)]
pub async fn close_widget_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WidgetSnapshotResponse>>, ApiError> {
    app_state.widget.lock().await.close().await?;
    Ok(Json(ApiResponse::ok(snapshot(&app_state).await)))
}

/// Flip the widget between open and closed.
#[utoipa::path(
    post,
    path = "/widget/toggle",
    responses(
        (status = 200, description = "Visibility flipped",
            body = ApiResponse<WidgetSnapshotResponse>),
        (status = 503, description = "Applied but not persisted", body = ErrorResponse)
    )
)]
pub async fn toggle_widget_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WidgetSnapshotResponse>>, ApiError> {
    app_state.widget.lock().await.toggle_open().await?;
    Ok(Json(ApiResponse::ok(snapshot(&app_state).await)))
}

/// Send a user message.
///
/// Once the message is admitted, and when a reply upstream is configured, a
/// reply is requested in the background and later appended as an assistant
/// message. This also happens when the save failed; the 503 response then
/// still carries the admitted message.
#[utoipa::path(
    post,
    path = "/widget/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message admitted and stored",
            body = ApiResponse<SentMessageResponse>),
        (status = 400, description = "Message text is empty", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded; see Retry-After", body = ErrorResponse),
        (status = 503, description = "Message admitted but not persisted",
            body = ApiResponse<SentMessageResponse>)
    )
)]
pub async fn send_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (admitted, remaining_quota) = {
        let mut widget = app_state.widget.lock().await;
        let admitted = widget.send_user_message(&req.text).await?;
        (admitted, widget.remaining_quota())
    };
    info!("User message {} accepted", admitted.message.id);

    spawn_reply(app_state.clone());

    let response = SentMessageResponse {
        message: admitted.message,
        remaining_quota,
    };
    Ok(match admitted.saved {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(response))),
        Err(e) => {
            warn!("User message {} kept in memory only: {}", response.message.id, e);
            let error = ApiError::from(e);
            (
                error.status(),
                Json(ApiResponse::applied_with_error(response, error.body())),
            )
        }
    })
}

/// Change the display language.
#[utoipa::path(
    put,
    path = "/widget/language",
    request_body = SetLanguageRequest,
    responses(
        (status = 200, description = "Language changed", body = ApiResponse<LanguageResponse>),
        (status = 400, description = "Unsupported language code", body = ErrorResponse),
        (status = 503, description = "Applied but not persisted", body = ErrorResponse)
    )
)]
pub async fn set_language_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SetLanguageRequest>,
) -> Result<Json<ApiResponse<LanguageResponse>>, ApiError> {
    let language = app_state.widget.lock().await.set_language(&req.code).await?;
    Ok(Json(ApiResponse::ok(LanguageResponse::from(language))))
}

/// Deliver an assistant reply produced by an external collaborator.
#[utoipa::path(
    post,
    path = "/widget/replies",
    request_body = DeliverReplyRequest,
    responses(
        (status = 201, description = "Reply appended", body = ApiResponse<DeliveredReplyResponse>),
        (status = 503, description = "Applied but not persisted", body = ErrorResponse)
    )
)]
pub async fn deliver_reply_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<DeliverReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = app_state
        .widget
        .lock()
        .await
        .deliver_assistant_message(&req.text, req.parts)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DeliveredReplyResponse { message })),
    ))
}
