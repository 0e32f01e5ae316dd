use crate::errors::FcmError;
use crate::models::ServiceAccountKey;

/// Google OAuth2 token endpoint; used as the assertion audience.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Permission requested for FCM HTTP v1 sends.
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const PRIVATE_KEY_MARKER: &str = "BEGIN PRIVATE KEY";

/// Identity used to sign bearer assertions. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential {
    pub issuer: String,
    pub audience: String,
    pub private_key: String,
    pub scope: String,
}

impl std::fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredential")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("private_key", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}

impl ServiceCredential {
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        private_key: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, FcmError> {
        let credential = Self {
            issuer: issuer.into(),
            audience: audience.into(),
            private_key: private_key.into(),
            scope: scope.into(),
        };

        let mut missing = Vec::new();
        if credential.issuer.is_empty() {
            missing.push("issuer");
        }
        if credential.audience.is_empty() {
            missing.push("audience");
        }
        if credential.private_key.is_empty() {
            missing.push("private_key");
        }
        if credential.scope.is_empty() {
            missing.push("scope");
        }
        if !missing.is_empty() {
            return Err(FcmError::Credential(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(credential)
    }

    /// Build the messaging credential for a service account, targeting the
    /// fixed Google token endpoint.
    pub fn from_service_account(key: &ServiceAccountKey) -> Result<Self, FcmError> {
        Self::new(
            key.client_email.clone(),
            GOOGLE_TOKEN_URL,
            key.private_key.clone(),
            FIREBASE_MESSAGING_SCOPE,
        )
    }
}

impl ServiceAccountKey {
    /// Parse and validate a service-account JSON document.
    pub fn from_json(text: &str) -> Result<Self, FcmError> {
        let key: ServiceAccountKey = serde_json::from_str(text).map_err(|e| {
            FcmError::Credential(format!("Invalid Firebase credentials format: {}", e))
        })?;
        key.validate()?;
        Ok(key)
    }

    pub fn validate(&self) -> Result<(), FcmError> {
        let fields = [
            ("type", &self.account_type),
            ("project_id", &self.project_id),
            ("private_key_id", &self.private_key_id),
            ("private_key", &self.private_key),
            ("client_email", &self.client_email),
            ("client_id", &self.client_id),
            ("auth_uri", &self.auth_uri),
            ("token_uri", &self.token_uri),
            ("auth_provider_x509_cert_url", &self.auth_provider_x509_cert_url),
            ("client_x509_cert_url", &self.client_x509_cert_url),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            tracing::error!(?missing, "Missing fields in service account");
            return Err(FcmError::Credential(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !self.private_key.contains(PRIVATE_KEY_MARKER) {
            return Err(FcmError::Credential(
                "Private key format is invalid".to_string(),
            ));
        }

        Ok(())
    }
}
