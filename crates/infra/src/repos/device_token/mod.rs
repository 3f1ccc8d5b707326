mod inmemory;
mod postgres;

use eppets_scheduler_domain::{DeviceToken, ID};
pub use inmemory::InMemoryDeviceTokenRepo;
pub use postgres::PostgresDeviceTokenRepo;

#[async_trait::async_trait]
pub trait IDeviceTokenRepo: Send + Sync {
    /// Registers a token for a `User`. Registering the same token twice
    /// is a noop.
    async fn insert(&self, device_token: &DeviceToken) -> anyhow::Result<()>;
    async fn find_by_user(&self, user_id: &ID) -> Vec<DeviceToken>;
    async fn delete(&self, user_id: &ID, token: &str) -> Option<DeviceToken>;
}
