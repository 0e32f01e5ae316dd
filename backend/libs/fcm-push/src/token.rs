use std::sync::Arc;
use std::time::Duration;

use crate::assertion::build_assertion;
use crate::clock::{Clock, SystemClock};
use crate::credential::ServiceCredential;
use crate::errors::{CallFailure, FcmError};
use crate::models::{TokenRequest, TokenResponse};
use crate::transport::{with_budget, HttpRequest, HttpTransport, TransportError};

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(8);

/// Exchanges signed assertions for OAuth2 bearer tokens.
///
/// Nothing is cached: each `acquire_token` call signs a new assertion and
/// performs one token exchange.
#[derive(Clone)]
pub struct AccessTokenProvider {
    credential: Arc<ServiceCredential>,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl AccessTokenProvider {
    pub fn new(credential: Arc<ServiceCredential>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credential,
            transport,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_TOKEN_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credential(&self) -> &ServiceCredential {
        &self.credential
    }

    /// Sign a fresh assertion at the clock's current time.
    pub fn assertion(&self) -> Result<String, FcmError> {
        build_assertion(&self.credential, self.clock.now_unix())
    }

    /// Get access token from service account
    pub async fn acquire_token(&self) -> Result<String, FcmError> {
        let assertion = self.assertion()?;

        let body = serde_json::to_string(&TokenRequest {
            grant_type: JWT_BEARER_GRANT,
            assertion: &assertion,
        })
        .map_err(|e| FcmError::TokenExchange(CallFailure::Malformed(e.to_string())))?;
        let request = HttpRequest::post_json(self.credential.audience.clone(), body);

        let response = with_budget(self.timeout, self.transport.send(request))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Access token request failed");
                FcmError::TokenExchange(call_failure(e))
            })?;

        if !response.is_success() {
            tracing::error!(
                status = response.status,
                body = %response.body,
                "Token exchange rejected"
            );
            return Err(FcmError::TokenExchange(CallFailure::Rejected {
                status: response.status,
                body: response.body,
            }));
        }

        let token_response: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            FcmError::TokenExchange(CallFailure::Malformed(format!(
                "Failed to parse token response: {}",
                e
            )))
        })?;

        let access_token = token_response.access_token.ok_or_else(|| {
            FcmError::TokenExchange(CallFailure::Malformed(
                "Token response is missing access_token".to_string(),
            ))
        })?;

        tracing::debug!(
            expires_in = ?token_response.expires_in,
            "Obtained access token"
        );
        Ok(access_token)
    }
}

pub(crate) fn call_failure(err: TransportError) -> CallFailure {
    match err {
        TransportError::TimedOut(budget) => CallFailure::TimedOut(budget),
        TransportError::Request(msg) => CallFailure::Transport(msg),
    }
}
