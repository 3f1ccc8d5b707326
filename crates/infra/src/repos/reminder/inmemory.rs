use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use eppets_scheduler_domain::{Reminder, ID};
use std::sync::Mutex;

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_due(&self, before_inc: i64) -> Vec<Reminder> {
        find_by(&self.reminders, |reminder| {
            reminder.is_active && reminder.next_trigger_at <= before_inc
        })
    }

    async fn advance(
        &self,
        reminder_id: &ID,
        prev_trigger_at: i64,
        next_trigger_at: i64,
    ) -> anyhow::Result<bool> {
        let mut reminders = self.reminders.lock().unwrap();
        for reminder in reminders.iter_mut() {
            if reminder.id == *reminder_id
                && reminder.is_active
                && reminder.next_trigger_at == prev_trigger_at
            {
                reminder.next_trigger_at = next_trigger_at;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn deactivate(&self, reminder_id: &ID) -> anyhow::Result<()> {
        update_many(
            &self.reminders,
            |reminder| reminder.id == *reminder_id,
            |reminder| reminder.is_active = false,
        );
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        delete(reminder_id, &self.reminders)
    }
}
