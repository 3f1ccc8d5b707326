use eppets_scheduler_domain::{RecurrenceSpec, ID};
use eppets_scheduler_infra::EppetsContext;
use tracing::{error, warn};

/// Outcome of rolling a `Reminder` forward after it fired
#[derive(Debug, Clone, PartialEq)]
pub enum Rollover {
    /// The reminder was moved to this `next_trigger_at`
    Advanced(i64),
    /// The recurrence is exhausted or absent, the reminder will not fire
    /// again
    Deactivated,
    /// Nothing was persisted. The reminder stays due and the next job run
    /// picks it up again
    Deferred,
}

/// Moves a `Reminder` to its next occurrence, or deactivates it when the
/// recurrence is exhausted.
///
/// Reads the stored reminder again instead of trusting the caller's copy,
/// since a concurrent job run may have advanced it in the meantime. The
/// next occurrence is searched strictly after the stored `next_trigger_at`
/// and persisted only when that value is still in place.
pub async fn roll_over_reminder(reminder_id: &ID, ctx: &EppetsContext) -> Rollover {
    let reminder = match ctx.repos.reminders.find(reminder_id).await {
        Some(reminder) => reminder,
        None => {
            warn!("Reminder {} was deleted before it could roll over", reminder_id);
            return Rollover::Deferred;
        }
    };

    if RecurrenceSpec::is_non_recurring(&reminder.recurrence_rule) {
        return deactivate(reminder_id, ctx).await;
    }

    let spec = if reminder.recurrence_rule.to_uppercase().contains("DTSTART") {
        RecurrenceSpec::anchored_by_rule(&reminder.recurrence_rule)
    } else {
        RecurrenceSpec::anchored_at(&reminder.recurrence_rule, reminder.trigger_at)
    };
    let spec = match spec {
        Ok(spec) => spec,
        Err(e) => {
            error!(
                "Reminder {} has an invalid recurrence rule {:?} and cannot roll over: {}",
                reminder_id, reminder.recurrence_rule, e
            );
            return Rollover::Deferred;
        }
    };

    match spec.next_occurrence_after(reminder.next_trigger_at) {
        Some(next_trigger_at) => {
            let advanced = ctx
                .repos
                .reminders
                .advance(reminder_id, reminder.next_trigger_at, next_trigger_at)
                .await;
            match advanced {
                Ok(true) => Rollover::Advanced(next_trigger_at),
                // A concurrent job run advanced it first, its write stands
                Ok(false) => Rollover::Deferred,
                Err(e) => {
                    error!("Unable to advance reminder {}: {:?}", reminder_id, e);
                    Rollover::Deferred
                }
            }
        }
        None => deactivate(reminder_id, ctx).await,
    }
}

async fn deactivate(reminder_id: &ID, ctx: &EppetsContext) -> Rollover {
    match ctx.repos.reminders.deactivate(reminder_id).await {
        Ok(_) => Rollover::Deactivated,
        Err(e) => {
            error!("Unable to deactivate reminder {}: {:?}", reminder_id, e);
            Rollover::Deferred
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eppets_scheduler_domain::Reminder;
    use eppets_scheduler_infra::setup_context_inmemory;

    const DAY: i64 = 1000 * 60 * 60 * 24;
    const START: i64 = 1704103258000; // Mon Jan 01 2024 10:00:58 GMT+0000

    fn reminder_with_rule(rule: &str) -> Reminder {
        Reminder::new(ID::default(), ID::default(), "Feed Nala", "food", START, rule)
    }

    #[tokio::test]
    async fn advances_recurring_reminder() {
        let ctx = setup_context_inmemory();
        let reminder = reminder_with_rule("FREQ=DAILY;INTERVAL=1");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let rollover = roll_over_reminder(&reminder.id, &ctx).await;
        assert_eq!(rollover, Rollover::Advanced(START + DAY));

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert_eq!(stored.next_trigger_at, START + DAY);
        assert_eq!(stored.trigger_at, START);
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn advances_from_the_stored_trigger_not_the_callers() {
        let ctx = setup_context_inmemory();
        let reminder = reminder_with_rule("FREQ=DAILY;INTERVAL=1");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        // Another job run already moved the reminder one day ahead
        ctx.repos
            .reminders
            .advance(&reminder.id, START, START + DAY)
            .await
            .unwrap();

        let rollover = roll_over_reminder(&reminder.id, &ctx).await;
        assert_eq!(rollover, Rollover::Advanced(START + 2 * DAY));
    }

    #[tokio::test]
    async fn deactivates_non_recurring_reminder_and_keeps_its_trigger() {
        let ctx = setup_context_inmemory();
        for rule in vec!["FREQ=NONE", "freq=none"] {
            let reminder = reminder_with_rule(rule);
            ctx.repos.reminders.insert(&reminder).await.unwrap();

            let rollover = roll_over_reminder(&reminder.id, &ctx).await;
            assert_eq!(rollover, Rollover::Deactivated);

            let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
            assert!(!stored.is_active);
            assert_eq!(stored.next_trigger_at, START);
        }
    }

    #[tokio::test]
    async fn defers_rule_embedding_the_non_recurring_marker() {
        let ctx = setup_context_inmemory();
        // Not the exact marker, so these take the parse path and fail there
        for rule in vec!["FREQ=NONE;INTERVAL=1", "DTSTART=20240101T100058Z;FREQ=NONE"] {
            let reminder = reminder_with_rule(rule);
            ctx.repos.reminders.insert(&reminder).await.unwrap();

            let rollover = roll_over_reminder(&reminder.id, &ctx).await;
            assert_eq!(rollover, Rollover::Deferred);

            let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
            assert_eq!(stored.next_trigger_at, START);
            assert!(stored.is_active);
        }
    }

    #[tokio::test]
    async fn deactivates_reminder_with_exhausted_count() {
        let ctx = setup_context_inmemory();
        let reminder = reminder_with_rule("FREQ=DAILY;COUNT=1");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let rollover = roll_over_reminder(&reminder.id, &ctx).await;
        assert_eq!(rollover, Rollover::Deactivated);
        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn uses_rule_embedded_start_when_present() {
        let ctx = setup_context_inmemory();
        // Rule anchor one hour after the reminder's own trigger timestamp
        let reminder = reminder_with_rule("DTSTART=20240101T110058Z;FREQ=DAILY");
        ctx.repos.reminders.insert(&reminder).await.unwrap();

        let rollover = roll_over_reminder(&reminder.id, &ctx).await;
        let hour = 1000 * 60 * 60;
        assert_eq!(rollover, Rollover::Advanced(START + hour));
    }

    #[tokio::test]
    async fn defers_reminder_with_invalid_rule() {
        let ctx = setup_context_inmemory();
        for rule in vec!["", "FREQ=SOMETIMES", "DTSTART=20240101T110058Z"] {
            let reminder = reminder_with_rule(rule);
            ctx.repos.reminders.insert(&reminder).await.unwrap();

            let rollover = roll_over_reminder(&reminder.id, &ctx).await;
            assert_eq!(rollover, Rollover::Deferred);

            // Left untouched so the next run can retry it
            let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
            assert_eq!(stored.next_trigger_at, START);
            assert!(stored.is_active);
        }
    }

    #[tokio::test]
    async fn defers_deleted_reminder() {
        let ctx = setup_context_inmemory();
        let rollover = roll_over_reminder(&ID::default(), &ctx).await;
        assert_eq!(rollover, Rollover::Deferred);
    }
}
