/// Device token lookup
///
/// Device tokens live in the `fcm_tokens` table of the data store, read
/// through its REST interface.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fcm_push::transport::with_budget;
use fcm_push::{HttpRequest, HttpTransport};
use serde::Deserialize;

use crate::config::SupabaseConfig;
use crate::error::{AppError, Result};

pub const TOKEN_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// First registered FCM token for the user, if any.
    async fn find_token(&self, user_id: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct TokenRow {
    token: Option<String>,
}

pub struct RestDeviceTokenStore {
    config: SupabaseConfig,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl RestDeviceTokenStore {
    pub fn new(config: SupabaseConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            timeout: TOKEN_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lookup_url(&self, user_id: &str) -> String {
        format!(
            "{}/rest/v1/fcm_tokens?user_id=eq.{}&select=token",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(user_id)
        )
    }
}

#[async_trait]
impl DeviceTokenStore for RestDeviceTokenStore {
    async fn find_token(&self, user_id: &str) -> Result<Option<String>> {
        let request = HttpRequest::get(self.lookup_url(user_id))
            .header("apikey", self.config.anon_key.as_str())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_role_key),
            );

        let response = with_budget(self.timeout, self.transport.send(request))
            .await
            .map_err(|e| AppError::DeviceToken(e.to_string()))?;

        if !response.is_success() {
            return Err(AppError::DeviceToken(format!(
                "data store returned status {}",
                response.status
            )));
        }

        let rows: Vec<TokenRow> = serde_json::from_str(&response.body)
            .map_err(|e| AppError::DeviceToken(format!("unexpected token rows: {}", e)))?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.token)
            .filter(|token| !token.is_empty()))
    }
}
