use super::IDeviceTokenRepo;
use crate::repos::shared::inmemory_repo::*;
use eppets_scheduler_domain::{DeviceToken, ID};
use std::sync::Mutex;

pub struct InMemoryDeviceTokenRepo {
    device_tokens: Mutex<Vec<DeviceToken>>,
}

impl InMemoryDeviceTokenRepo {
    pub fn new() -> Self {
        Self {
            device_tokens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IDeviceTokenRepo for InMemoryDeviceTokenRepo {
    async fn insert(&self, device_token: &DeviceToken) -> anyhow::Result<()> {
        let registered = !find_by(&self.device_tokens, |t| {
            t.user_id == device_token.user_id && t.token == device_token.token
        })
        .is_empty();
        if !registered {
            insert(device_token, &self.device_tokens);
        }
        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<DeviceToken> {
        find_by(&self.device_tokens, |t| t.user_id == *user_id)
    }

    async fn delete(&self, user_id: &ID, token: &str) -> Option<DeviceToken> {
        find_and_delete_by(&self.device_tokens, |t| {
            t.user_id == *user_id && t.token == token
        })
        .pop()
    }
}
