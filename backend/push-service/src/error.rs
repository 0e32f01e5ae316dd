/// Error types for Push Service
///
/// Every variant maps onto the JSON error body returned by the send-push
/// endpoint.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use fcm_push::FcmError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Failed to get FCM token: {0}")]
    DeviceToken(String),

    #[error("{0}")]
    Notification(#[from] FcmError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidJson | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::DeviceToken(_) => StatusCode::NOT_FOUND,
            AppError::Notification(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Config(_) => json!({ "error": "Internal server error" }),
            AppError::InvalidJson => json!({ "error": "Invalid JSON" }),
            AppError::MissingFields(missing) => json!({
                "error": "Missing required fields",
                "missing": missing,
            }),
            AppError::DeviceToken(_) => json!({ "error": "Failed to get FCM token" }),
            AppError::Notification(e) => json!({
                "error": "Notification failed",
                "message": e.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcm_push::CallFailure;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidJson.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MissingFields(vec!["title"]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DeviceToken("none".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(FcmError::Delivery(CallFailure::Transport("reset".into())))
                .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_missing_fields_display() {
        let err = AppError::MissingFields(vec!["user_id", "description"]);
        assert_eq!(err.to_string(), "Missing required fields: user_id, description");
    }
}
