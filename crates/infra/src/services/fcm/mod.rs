mod fcm_api;

pub use fcm_api::FcmRestApi;

use eppets_scheduler_domain::{MulticastSummary, PushNotification, SendOutcome};
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait::async_trait]
pub trait IPushService: Send + Sync {
    /// Sends one notification to all given device tokens and returns one
    /// outcome per token, in the same order as the token list. An `Err`
    /// means the whole multicast failed and nothing was delivered.
    async fn send_multicast(
        &self,
        notification: &PushNotification,
        device_tokens: &[String],
    ) -> anyhow::Result<MulticastSummary>;
}

/// Push service double that records every multicast and answers with
/// outcomes scripted by the test
pub struct InMemoryPushService {
    pub sent: Mutex<Vec<(PushNotification, Vec<String>)>>,
    token_errors: Mutex<HashMap<String, String>>,
    unreachable: Mutex<bool>,
}

impl InMemoryPushService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            token_errors: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(false),
        }
    }

    /// Scripts a delivery error for one token on subsequent multicasts
    pub fn fail_token(&self, device_token: &str, error: &str) {
        self.token_errors
            .lock()
            .unwrap()
            .insert(device_token.to_string(), error.to_string());
    }

    /// Makes subsequent multicasts fail as a whole
    pub fn fail_transport(&self) {
        *self.unreachable.lock().unwrap() = true;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl IPushService for InMemoryPushService {
    async fn send_multicast(
        &self,
        notification: &PushNotification,
        device_tokens: &[String],
    ) -> anyhow::Result<MulticastSummary> {
        if *self.unreachable.lock().unwrap() {
            return Err(anyhow::anyhow!("Push delivery service is unreachable"));
        }

        let outcomes = {
            let token_errors = self.token_errors.lock().unwrap();
            device_tokens
                .iter()
                .map(|token| match token_errors.get(token) {
                    Some(error) => SendOutcome::failure(error),
                    None => SendOutcome::success(),
                })
                .collect()
        };
        self.sent
            .lock()
            .unwrap()
            .push((notification.clone(), device_tokens.to_vec()));

        Ok(MulticastSummary::new(outcomes))
    }
}
