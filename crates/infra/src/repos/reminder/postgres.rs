use super::IReminderRepo;
use eppets_scheduler_domain::{Reminder, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    user_uid: Uuid,
    pet_uid: Uuid,
    title: String,
    body: Option<String>,
    instructions: Option<String>,
    reminder_type: String,
    trigger_at: i64,
    next_trigger_at: i64,
    recurrence_rule: String,
    is_active: bool,
}

impl Into<Reminder> for ReminderRaw {
    fn into(self) -> Reminder {
        Reminder {
            id: self.reminder_uid.into(),
            user_id: self.user_uid.into(),
            pet_id: self.pet_uid.into(),
            title: self.title,
            body: self.body,
            instructions: self.instructions,
            reminder_type: self.reminder_type,
            trigger_at: self.trigger_at,
            next_trigger_at: self.next_trigger_at,
            recurrence_rule: self.recurrence_rule,
            is_active: self.is_active,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, user_uid, pet_uid, title, body, instructions, reminder_type, trigger_at, next_trigger_at, recurrence_rule, is_active)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(reminder.user_id.inner_ref())
        .bind(reminder.pet_id.inner_ref())
        .bind(&reminder.title)
        .bind(&reminder.body)
        .bind(&reminder.instructions)
        .bind(&reminder.reminder_type)
        .bind(reminder.trigger_at)
        .bind(reminder.next_trigger_at)
        .bind(&reminder.recurrence_rule)
        .bind(reminder.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        let reminder: ReminderRaw = match sqlx::query_as(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(reminder) => reminder,
            Err(_) => return None,
        };
        Some(reminder.into())
    }

    async fn find_due(&self, before_inc: i64) -> Vec<Reminder> {
        let reminders: Vec<ReminderRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.is_active = TRUE AND r.next_trigger_at <= $1
            "#,
        )
        .bind(before_inc)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to query due reminders: {:?}", e);
            vec![]
        });

        reminders.into_iter().map(|r| r.into()).collect()
    }

    async fn advance(
        &self,
        reminder_id: &ID,
        prev_trigger_at: i64,
        next_trigger_at: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminders AS r
            SET next_trigger_at = $2
            WHERE r.reminder_uid = $1 AND r.next_trigger_at = $3 AND r.is_active = TRUE
            "#,
        )
        .bind(reminder_id.inner_ref())
        .bind(next_trigger_at)
        .bind(prev_trigger_at)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn deactivate(&self, reminder_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders AS r
            SET is_active = FALSE
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        match sqlx::query_as::<_, ReminderRaw>(
            r#"
            DELETE FROM reminders AS r
            WHERE r.reminder_uid = $1
            RETURNING *
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_one(&self.pool)
        .await
        {
            Ok(reminder) => Some(reminder.into()),
            Err(_) => None,
        }
    }
}
