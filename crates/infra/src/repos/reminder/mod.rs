mod inmemory;
mod postgres;

use eppets_scheduler_domain::{Reminder, ID};
pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// All active `Reminder`s that are due at or before the given timestamp
    async fn find_due(&self, before_inc: i64) -> Vec<Reminder>;
    /// Moves `next_trigger_at` forward, but only for an active `Reminder`
    /// whose stored value still equals `prev_trigger_at`. Returns whether a
    /// row was updated, so that concurrent job runs cannot advance the same
    /// `Reminder` twice. Never touches `is_active`, a deactivation that races
    /// the job run must stand.
    async fn advance(
        &self,
        reminder_id: &ID,
        prev_trigger_at: i64,
        next_trigger_at: i64,
    ) -> anyhow::Result<bool>;
    async fn deactivate(&self, reminder_id: &ID) -> anyhow::Result<()>;
    async fn delete(&self, reminder_id: &ID) -> Option<Reminder>;
}
