use super::IPushService;
use crate::config::Config;
use eppets_scheduler_domain::{MulticastSummary, PushNotification, PushPriority, SendOutcome};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

const FCM_API_URL: &str = "https://fcm.googleapis.com/fcm/send";

/// Client for the FCM legacy HTTP API, which the eppets mobile and web
/// apps register their device tokens against
pub struct FcmRestApi {
    client: Client,
    server_key: String,
}

impl FcmRestApi {
    pub fn new(config: &Config) -> Self {
        let client = Client::new();

        Self {
            client,
            server_key: config.fcm_server_key.clone(),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, body: &impl Serialize) -> anyhow::Result<T> {
        match self
            .client
            .post(FCM_API_URL)
            .header("authorization", format!("key={}", self.server_key))
            .json(body)
            .send()
            .await
        {
            Ok(res) => res.json::<T>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] FCM API POST error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!("[Network Error] FCM API POST error. Error message: {:?}", e);
                Err(anyhow::Error::new(e))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct FcmMulticastRequest<'a> {
    registration_ids: &'a [String],
    notification: FcmNotification<'a>,
    data: &'a HashMap<String, String>,
    priority: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmSendResult {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FcmMulticastResponse {
    success: usize,
    failure: usize,
    results: Vec<FcmSendResult>,
}

#[async_trait::async_trait]
impl IPushService for FcmRestApi {
    async fn send_multicast(
        &self,
        notification: &PushNotification,
        device_tokens: &[String],
    ) -> anyhow::Result<MulticastSummary> {
        let priority = match notification.priority {
            PushPriority::High => "high",
            PushPriority::Normal => "normal",
        };
        let request = FcmMulticastRequest {
            registration_ids: device_tokens,
            notification: FcmNotification {
                title: &notification.title,
                body: &notification.body,
                sound: notification.sound.as_deref(),
            },
            data: &notification.data,
            priority,
        };

        let res: FcmMulticastResponse = self.post(&request).await?;

        Ok(MulticastSummary {
            success_count: res.success,
            failure_count: res.failure,
            outcomes: res
                .results
                .into_iter()
                .map(|result| SendOutcome {
                    error: result.error,
                })
                .collect(),
        })
    }
}
