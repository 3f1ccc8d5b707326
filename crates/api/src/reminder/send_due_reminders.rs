use crate::reminder::clean_invalid_tokens::clean_invalid_tokens;
use crate::reminder::roll_over_reminder::{roll_over_reminder, Rollover};
use crate::shared::usecase::UseCase;
use eppets_scheduler_domain::{PushNotification, PushPriority, Reminder};
use eppets_scheduler_infra::EppetsContext;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{error, info};

const MINUTE_IN_MILLIS: i64 = 1000 * 60;

/// Fallback notification text for reminders without a body
const DEFAULT_NOTIFICATION_BODY: &str = "Tienes una nueva notificación";

/// The last millisecond of the minute that `now` falls in. The job runs
/// once every minute, so each run picks up everything that is due within
/// its own minute, even when the timer fires a few seconds late.
pub fn tick_window_end(now: i64) -> i64 {
    now - now % MINUTE_IN_MILLIS + MINUTE_IN_MILLIS - 1
}

/// Runs one reminder job tick: finds every due `Reminder`, notifies the
/// owners devices and rolls each reminder forward to its next occurrence.
/// Reminders are processed independently, one broken reminder never blocks
/// the others.
#[derive(Debug)]
pub struct SendDueRemindersUseCase {}

#[derive(Debug, Default, PartialEq)]
pub struct TickSummary {
    pub processed: usize,
    pub notified: usize,
    pub advanced: usize,
    pub deactivated: usize,
    pub deferred: usize,
}

#[derive(Debug)]
pub enum UseCaseError {}

#[async_trait::async_trait]
impl UseCase for SendDueRemindersUseCase {
    type Response = TickSummary;

    type Error = UseCaseError;

    const NAME: &'static str = "SendDueReminders";

    async fn execute(&mut self, ctx: &EppetsContext) -> Result<Self::Response, Self::Error> {
        let window_end = tick_window_end(ctx.sys.get_timestamp_millis());
        let due_reminders = ctx.repos.reminders.find_due(window_end).await;

        let outcomes = join_all(
            due_reminders
                .into_iter()
                .map(|reminder| process_due_reminder(reminder, ctx)),
        )
        .await;

        let mut summary = TickSummary {
            processed: outcomes.len(),
            ..Default::default()
        };
        for (notified, rollover) in outcomes {
            if notified {
                summary.notified += 1;
            }
            match rollover {
                Rollover::Advanced(_) => summary.advanced += 1,
                Rollover::Deactivated => summary.deactivated += 1,
                Rollover::Deferred => summary.deferred += 1,
            }
        }
        if summary.processed > 0 {
            info!(
                "Reminder job tick: {} processed, {} notified, {} advanced, {} deactivated, {} deferred",
                summary.processed,
                summary.notified,
                summary.advanced,
                summary.deactivated,
                summary.deferred
            );
        }

        Ok(summary)
    }
}

/// Notifies the owners devices about one due `Reminder` and rolls it
/// forward. Returns whether a notification was handed to the delivery
/// service, and the rollover outcome.
async fn process_due_reminder(reminder: Reminder, ctx: &EppetsContext) -> (bool, Rollover) {
    let mut notified = false;

    let device_tokens = ctx
        .repos
        .device_tokens
        .find_by_user(&reminder.user_id)
        .await
        .into_iter()
        .map(|device_token| device_token.token)
        .collect::<Vec<_>>();

    if !device_tokens.is_empty() {
        let notification = build_reminder_notification(&reminder);
        match ctx.push.send_multicast(&notification, &device_tokens).await {
            Ok(summary) => {
                notified = true;
                if summary.failure_count > 0 {
                    clean_invalid_tokens(
                        &summary.outcomes,
                        &device_tokens,
                        &reminder.user_id,
                        ctx,
                    )
                    .await;
                }
            }
            Err(e) => {
                error!(
                    "Unable to notify devices about reminder {}: {:?}",
                    reminder.id, e
                );
            }
        }
    }

    // The schedule moves on no matter how the send went, a failing
    // reminder must not come back every minute forever
    let rollover = roll_over_reminder(&reminder.id, ctx).await;
    (notified, rollover)
}

fn build_reminder_notification(reminder: &Reminder) -> PushNotification {
    let mut data = HashMap::new();
    data.insert("petId".to_string(), reminder.pet_id.as_string());
    data.insert("type".to_string(), reminder.reminder_type.clone());
    data.insert(
        "instructions".to_string(),
        reminder.instructions.clone().unwrap_or_default(),
    );

    PushNotification {
        title: reminder.title.clone(),
        body: reminder
            .body
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
        data,
        priority: PushPriority::High,
        sound: Some("default".to_string()),
    }
}
