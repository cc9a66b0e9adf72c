use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ports::push::{DeliveryFailure, PushSender};
use crate::ports::store::{self, RoomStore, StaleSubscription};
use crate::types::push::VapidConfig;
use crate::types::room::{MachineType, PushSubscription};

impl DeliveryFailure for web_push::WebPushError {
    /// 410 Gone and 404 Not Found both mean the browser dropped the subscription.
    fn is_permanent(&self) -> bool {
        matches!(
            self,
            web_push::WebPushError::EndpointNotValid { .. }
                | web_push::WebPushError::EndpointNotFound { .. }
        )
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }
}

impl PushSender for WebPushSender {
    type Error = web_push::WebPushError;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, message: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            let subscription_info = web_push::SubscriptionInfo::new(
                subscription.endpoint.clone(),
                subscription.keys.p256dh.clone(),
                subscription.keys.auth.clone(),
            );
            let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
            builder.set_payload(web_push::ContentEncoding::Aes128Gcm, message.as_bytes());
            let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
                &self.vapid.private_key,
                web_push::URL_SAFE_NO_PAD,
                &subscription_info,
            )?;
            signature_builder.add_claim("sub", self.vapid.subject.as_str());
            builder.set_vapid_signature(signature_builder.build()?);
            self.client.send(builder.build()?).await?;
            Ok(())
        })
    }
}

/// Realtime database REST client. Key segments map to `<base>/<a>/<b>.json`.
#[derive(Clone)]
pub struct FirebaseStore {
    client: reqwest::Client,
    base_url: reqwest::Url,
    secret: Option<String>,
}

impl FirebaseStore {
    pub fn new(base_url: &str, secret: Option<String>) -> Result<Self, String> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|err| format!("invalid database url '{base_url}': {err}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("database url '{base_url}' cannot hold paths"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            secret,
        })
    }

    /// Every segment and the secret are percent-encoded, so member names and
    /// keys can never change the addressed path.
    fn url(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            match segments.split_last() {
                Some((last, parents)) => {
                    path.extend(parents);
                    path.push(&format!("{last}.json"));
                }
                None => {
                    path.push(".json");
                }
            }
        }
        if let Some(secret) = self.secret.as_deref() {
            url.query_pairs_mut().append_pair("auth", secret);
        }
        url
    }

    async fn put<T: serde::Serialize + Sync>(
        &self,
        segments: &[&str],
        value: &T,
    ) -> Result<(), reqwest::Error> {
        self.client
            .put(self.url(segments))
            .json(value)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Multi-path update that deletes every stale entry in one request.
fn removal_updates(room_id: &str, stale: &[StaleSubscription]) -> Value {
    let updates: Map<String, Value> = stale
        .iter()
        .map(|entry| {
            (
                store::push_subscription_path(room_id, &entry.username, &entry.key),
                Value::Null,
            )
        })
        .collect();
    Value::Object(updates)
}

impl RoomStore for FirebaseStore {
    type Error = reqwest::Error;
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), Self::Error>> + Send + 'a>>
    where
        Self: 'a;

    fn set_subscription_flag<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        machine_type: MachineType,
        enabled: bool,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let segments = store::subscription_flag_segments(room_id, username, machine_type);
            self.put(&segments, &enabled).await
        })
    }

    fn put_push_subscription<'a>(
        &'a self,
        room_id: &'a str,
        username: &'a str,
        key: &'a str,
        subscription: &'a PushSubscription,
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            let segments = store::push_subscription_segments(room_id, username, key);
            self.put(&segments, subscription).await
        })
    }

    fn remove_push_subscriptions<'a>(
        &'a self,
        room_id: &'a str,
        stale: &'a [StaleSubscription],
    ) -> Self::Fut<'a> {
        Box::pin(async move {
            self.client
                .patch(self.url(&[]))
                .json(&removal_updates(room_id, stale))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}
