//! services/api/src/web/reply_task.rs
//!
//! Requests an assistant reply after an admitted user message and delivers it
//! back into the widget once it arrives.

use crate::error::ApiError;
use crate::web::state::AppState;
use chat_widget_core::ReplyService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Starts a reply request in the background, if a reply service is configured.
///
/// The task is never cancelled by closing the widget; a late reply is still
/// appended to the transcript.
pub fn spawn_reply(app_state: Arc<AppState>) -> Option<JoinHandle<()>> {
    let reply_service = app_state.reply_service.clone()?;
    Some(tokio::spawn(async move {
        if let Err(e) = reply_process(app_state, reply_service).await {
            error!("Reply process failed: {}", e);
        }
    }))
}

async fn reply_process(
    app_state: Arc<AppState>,
    reply_service: Arc<dyn ReplyService>,
) -> Result<(), ApiError> {
    // Copy what the upstream needs so the lock is not held across the request.
    let (transcript, language) = {
        let widget = app_state.widget.lock().await;
        (widget.messages().as_slice().to_vec(), widget.language())
    };

    let reply = reply_service.request_reply(&transcript, language).await?;

    let mut widget = app_state.widget.lock().await;
    let message = widget
        .deliver_assistant_message(&reply.content, reply.parts)
        .await?;
    info!("Assistant reply {} delivered", message.id);
    Ok(())
}
