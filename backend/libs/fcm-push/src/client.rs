use std::sync::Arc;
use std::time::Duration;

use crate::errors::{CallFailure, FcmError};
use crate::models::*;
use crate::token::{call_failure, AccessTokenProvider};
use crate::transport::{with_budget, HttpRequest, HttpTransport};

pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com/v1";

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Firebase Cloud Messaging Client
///
/// Sends one notification per call through the FCM HTTP v1 API. Every send
/// obtains a fresh access token first; the two calls run strictly in order
/// and neither is retried.
#[derive(Clone)]
pub struct FcmClient {
    pub project_id: String,
    base_url: String,
    tokens: AccessTokenProvider,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl FcmClient {
    /// Create new FCM client
    ///
    /// # Arguments
    /// * `project_id` - Firebase project ID
    /// * `tokens` - Provider that signs and exchanges assertions
    /// * `transport` - HTTP transport used for the delivery call
    pub fn new(
        project_id: impl Into<String>,
        tokens: AccessTokenProvider,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            base_url: FCM_BASE_URL.to_string(),
            tokens,
            transport,
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn send_url(&self) -> String {
        format!("{}/projects/{}/messages:send", self.base_url, self.project_id)
    }

    /// Send notification via FCM to a single device
    pub async fn send_notification(
        &self,
        notification: &PushNotification,
    ) -> Result<DeliveryReceipt, FcmError> {
        tracing::info!(
            target_prefix = %mask_token(&notification.target),
            project_id = %self.project_id,
            "Starting push notification"
        );

        let access_token = self.tokens.acquire_token().await?;

        let body = serde_json::to_string(&build_envelope(notification))
            .map_err(|e| FcmError::Delivery(CallFailure::Malformed(e.to_string())))?;
        let request = HttpRequest::post_json(self.send_url(), body)
            .header("Authorization", format!("Bearer {}", access_token));

        let response = with_budget(self.timeout, self.transport.send(request))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "FCM send request failed");
                FcmError::Delivery(call_failure(e))
            })?;

        if !response.is_success() {
            tracing::error!(
                status = response.status,
                body = %response.body,
                "FCM API error"
            );
            return Err(FcmError::Delivery(CallFailure::Rejected {
                status: response.status,
                body: response.body,
            }));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            FcmError::Delivery(CallFailure::Malformed(format!(
                "Failed to parse FCM response: {}",
                e
            )))
        })
    }
}

/// Build the FCM v1 message envelope.
///
/// When an image is present both the Android and the APNs image hints are
/// attached, whatever platform the device token belongs to.
pub fn build_envelope(notification: &PushNotification) -> FcmMessage {
    let content = FcmNotification {
        title: notification.title.clone(),
        body: notification.body.clone(),
    };

    let (android, apns) = match &notification.image {
        Some(image) => (
            Some(AndroidConfig {
                notification: AndroidNotification {
                    image: image.clone(),
                },
            }),
            Some(ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        mutable_content: 1,
                        alert: content.clone(),
                    },
                },
                fcm_options: ApnsFcmOptions {
                    image: image.clone(),
                },
            }),
        ),
        None => (None, None),
    };

    FcmMessage {
        message: FcmMessageContent {
            token: notification.target.clone(),
            notification: content,
            android,
            apns,
            data: notification.data.clone().unwrap_or_default(),
        },
    }
}

/// First six characters of a device token, for log lines.
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{ServiceCredential, FIREBASE_MESSAGING_SCOPE, GOOGLE_TOKEN_URL};
    use crate::transport::{HttpResponse, TransportError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_private_key.pem");

    /// Answers the token endpoint with a fixed token and the send endpoint
    /// with a configurable response.
    struct FakeProvider {
        send_status: u16,
        send_body: String,
        hang_on_send: bool,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeProvider {
        fn new(send_status: u16, send_body: &str) -> Arc<Self> {
            Arc::new(Self {
                send_status,
                send_body: send_body.to_string(),
                hang_on_send: false,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self {
                send_status: 200,
                send_body: String::new(),
                hang_on_send: true,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeProvider {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let is_token_call = request.url == GOOGLE_TOKEN_URL;
            self.requests.lock().unwrap().push(request);
            if is_token_call {
                return Ok(HttpResponse {
                    status: 200,
                    body: r#"{"access_token":"tok-1","expires_in":3599}"#.to_string(),
                });
            }
            if self.hang_on_send {
                std::future::pending::<()>().await;
            }
            Ok(HttpResponse {
                status: self.send_status,
                body: self.send_body.clone(),
            })
        }
    }

    fn client(transport: Arc<FakeProvider>) -> FcmClient {
        let credential = Arc::new(
            ServiceCredential::new(
                "push@demo-store.iam.gserviceaccount.com",
                GOOGLE_TOKEN_URL,
                TEST_KEY,
                FIREBASE_MESSAGING_SCOPE,
            )
            .unwrap(),
        );
        let tokens = AccessTokenProvider::new(credential, transport.clone());
        FcmClient::new("demo-store", tokens, transport)
    }

    #[test]
    fn test_envelope_without_image() {
        let envelope = build_envelope(&PushNotification::new("device-token", "Hi", "Body"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "message": {
                    "token": "device-token",
                    "notification": {"title": "Hi", "body": "Body"},
                    "data": {}
                }
            })
        );
    }

    #[test]
    fn test_envelope_with_image_carries_both_platform_blocks() {
        let mut data = BTreeMap::new();
        data.insert("order_id".to_string(), "42".to_string());
        let notification = PushNotification::new("device-token", "Sale", "Half off")
            .with_image("https://cdn.test/p.png")
            .with_data(data);

        let value = serde_json::to_value(build_envelope(&notification)).unwrap();
        assert_eq!(
            value["message"]["android"],
            json!({"notification": {"image": "https://cdn.test/p.png"}})
        );
        assert_eq!(
            value["message"]["apns"],
            json!({
                "payload": {"aps": {
                    "mutable-content": 1,
                    "alert": {"title": "Sale", "body": "Half off"}
                }},
                "fcm_options": {"image": "https://cdn.test/p.png"}
            })
        );
        assert_eq!(value["message"]["data"], json!({"order_id": "42"}));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefghijkl"), "abcdef...");
        assert_eq!(mask_token("abc"), "abc...");
    }

    #[test]
    fn test_send_url_trims_trailing_slash() {
        let c = client(FakeProvider::new(200, "{}")).with_base_url("http://localhost:9000/v1/");
        assert_eq!(
            c.send_url(),
            "http://localhost:9000/v1/projects/demo-store/messages:send"
        );
    }

    #[tokio::test]
    async fn test_send_returns_receipt() {
        let transport = FakeProvider::new(200, r#"{"name":"projects/demo-store/messages/0:1"}"#);
        let receipt = client(transport.clone())
            .send_notification(&PushNotification::new("device-token", "Hi", "Body"))
            .await
            .unwrap();

        assert_eq!(receipt["name"], "projects/demo-store/messages/0:1");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, GOOGLE_TOKEN_URL);
        assert_eq!(
            requests[1].url,
            "https://fcm.googleapis.com/v1/projects/demo-store/messages:send"
        );
        assert_eq!(requests[1].header_value("Authorization"), Some("Bearer tok-1"));
    }

    #[tokio::test]
    async fn test_send_rejection_carries_status_and_body() {
        let transport = FakeProvider::new(404, r#"{"error":{"status":"NOT_FOUND"}}"#);
        let err = client(transport)
            .send_notification(&PushNotification::new("stale-token", "Hi", "Body"))
            .await
            .unwrap_err();

        assert!(matches!(err, FcmError::Delivery(_)));
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some(r#"{"error":{"status":"NOT_FOUND"}}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_timeout_is_delivery_error() {
        let err = client(FakeProvider::hanging())
            .send_notification(&PushNotification::new("device-token", "Hi", "Body"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FcmError::Delivery(CallFailure::TimedOut(DEFAULT_SEND_TIMEOUT))
        );
    }

    #[tokio::test]
    async fn test_non_json_receipt_is_malformed() {
        let err = client(FakeProvider::new(200, "ok"))
            .send_notification(&PushNotification::new("device-token", "Hi", "Body"))
            .await
            .unwrap_err();
        assert!(matches!(err, FcmError::Delivery(CallFailure::Malformed(_))));
    }

    #[tokio::test]
    async fn test_each_send_fetches_a_new_token() {
        let transport = FakeProvider::new(200, "{}");
        let c = client(transport.clone());
        let n = PushNotification::new("device-token", "Hi", "Body");
        c.send_notification(&n).await.unwrap();
        c.send_notification(&n).await.unwrap();

        let token_calls = transport
            .requests()
            .iter()
            .filter(|r| r.url == GOOGLE_TOKEN_URL)
            .count();
        assert_eq!(token_calls, 2);
    }
}
