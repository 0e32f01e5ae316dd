use std::collections::BTreeMap;
use std::sync::Arc;

use fcm_push::client::mask_token;
use fcm_push::{DeliveryReceipt, FcmClient, PushNotification};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token_store::DeviceTokenStore;
use crate::error::{AppError, Result};

/// Incoming send-push body. All fields are optional at the wire level so
/// that missing ones can be reported together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendPushRequest {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
}

/// A send-push request whose required fields are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPush {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub seller_id: Option<String>,
}

impl SendPushRequest {
    pub fn validate(self) -> Result<ValidatedPush> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        let mut missing = Vec::new();
        if !present(&self.user_id) {
            missing.push("user_id");
        }
        if !present(&self.title) {
            missing.push("title");
        }
        if !present(&self.description) {
            missing.push("description");
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Ok(ValidatedPush {
            user_id: self.user_id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: non_empty(self.image),
            order_id: non_empty(self.order_id),
            product_id: non_empty(self.product_id),
            seller_id: non_empty(self.seller_id),
        })
    }
}

/// Auxiliary data the client app reads to render the notification.
pub fn notification_data(push: &ValidatedPush, id: Uuid) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert("id".to_string(), id.to_string());
    data.insert("description".to_string(), push.description.clone());
    data.insert("title".to_string(), push.title.clone());
    data.insert("user_id".to_string(), push.user_id.clone());
    data.insert("read".to_string(), "false".to_string());

    let optional = [
        ("order_id", &push.order_id),
        ("product_id", &push.product_id),
        ("seller_id", &push.seller_id),
        ("logo", &push.image),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            data.insert(key.to_string(), value.clone());
        }
    }
    data
}

/// Looks up the user's device and pushes one notification to it.
pub struct PushDispatcher {
    tokens: Arc<dyn DeviceTokenStore>,
    fcm: FcmClient,
}

impl PushDispatcher {
    pub fn new(tokens: Arc<dyn DeviceTokenStore>, fcm: FcmClient) -> Self {
        Self { tokens, fcm }
    }

    pub async fn dispatch(&self, request_id: Uuid, push: ValidatedPush) -> Result<DeliveryReceipt> {
        let device_token = match self.tokens.find_token(&push.user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::warn!(%request_id, user_id = %push.user_id, "No FCM token found");
                return Err(AppError::DeviceToken("No token found".to_string()));
            }
            Err(e) => {
                tracing::error!(%request_id, error = %e, "Token fetch failed");
                return Err(e);
            }
        };

        tracing::info!(
            %request_id,
            token = %mask_token(&device_token),
            "Sending push notification"
        );

        let mut notification = PushNotification::new(
            device_token,
            push.title.clone(),
            push.description.clone(),
        )
        .with_data(notification_data(&push, Uuid::new_v4()));
        notification.image = push.image.clone();

        self.fcm.send_notification(&notification).await.map_err(|e| {
            tracing::error!(%request_id, error = %e, "Notification failed");
            AppError::from(e)
        })
    }
}
