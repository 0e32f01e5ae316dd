use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub supabase: SupabaseConfig,
    pub firebase: FirebaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

/// Data store holding the `fcm_tokens` table
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Raw service-account JSON document
    pub account_secrets: String,
    /// Overrides the FCM v1 base URL (emulators, tests)
    pub base_url: Option<String>,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .map_err(|e| AppError::Config(format!("APP_PORT: {}", e)))?,
            },
            supabase: SupabaseConfig {
                url: required("SUPABASE_URL")?,
                anon_key: required("SUPABASE_ANON_KEY")?,
                service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            },
            firebase: FirebaseConfig {
                account_secrets: required("FIREBASE_ACCOUNT_SECRETS")?,
                base_url: std::env::var("FCM_BASE_URL").ok().filter(|v| !v.is_empty()),
            },
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Config(format!("{} is not set", name))),
    }
}
