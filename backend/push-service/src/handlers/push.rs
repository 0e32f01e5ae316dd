/// Send-push handler
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::{PushDispatcher, SendPushRequest};

/// Send a push notification to a user's registered device
///
/// POST /send-push
pub async fn send_push(
    dispatcher: web::Data<Arc<PushDispatcher>>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, "New request received");

    let input: SendPushRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(%request_id, error = %e, "JSON parse error");
        AppError::InvalidJson
    })?;
    tracing::info!(
        %request_id,
        user_id = ?input.user_id,
        title = ?input.title.as_deref().map(|t| t.chars().take(20).collect::<String>()),
        "Parsed input"
    );

    let push = input.validate()?;
    let result = dispatcher.dispatch(request_id, push).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "result": result,
    })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/send-push", web::post().to(send_push))
        .route("/health", web::get().to(|| async { "OK" }));
}
