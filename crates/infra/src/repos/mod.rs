mod device_token;
mod reminder;
mod shared;

use device_token::{InMemoryDeviceTokenRepo, PostgresDeviceTokenRepo};
use reminder::{InMemoryReminderRepo, PostgresReminderRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

pub use device_token::IDeviceTokenRepo;
pub use reminder::IReminderRepo;

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub device_tokens: Arc<dyn IDeviceTokenRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        // This is needed to make sure that db is ready when starting the job scheduler
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");

        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            device_tokens: Arc::new(PostgresDeviceTokenRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminders: Arc::new(InMemoryReminderRepo::new()),
            device_tokens: Arc::new(InMemoryDeviceTokenRepo::new()),
        }
    }
}
