use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provider JSON body returned by a successful send.
pub type DeliveryReceipt = serde_json::Value;

/// Firebase Service Account Key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub account_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub client_x509_cert_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe_domain: Option<String>,
}

/// JWT header for the bearer assertion
#[derive(Debug, Serialize)]
pub struct AssertionHeader {
    pub alg: &'static str,
    pub typ: &'static str,
}

/// JWT claims for the OAuth2 JWT-bearer grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token exchange request body
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub assertion: &'a str,
}

/// OAuth2 token response; only `access_token` is required
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// A single push message addressed to one device token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushNotification {
    pub target: String,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
}

impl PushNotification {
    pub fn new(target: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            title: title.into(),
            body: body.into(),
            image: None,
            data: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    pub message: FcmMessageContent,
}

/// FCM Message Content
#[derive(Debug, Serialize)]
pub struct FcmMessageContent {
    pub token: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
    pub data: BTreeMap<String, String>,
}

/// FCM Notification Payload
#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Serialize)]
pub struct AndroidNotification {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
    pub fcm_options: ApnsFcmOptions,
}

#[derive(Debug, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Serialize)]
pub struct Aps {
    #[serde(rename = "mutable-content")]
    pub mutable_content: u8,
    pub alert: FcmNotification,
}

#[derive(Debug, Serialize)]
pub struct ApnsFcmOptions {
    pub image: String,
}
