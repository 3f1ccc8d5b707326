use crate::shared::entity::{Entity, ID};

/// A `Reminder` represents a care task for a pet about which the owning
/// user should be notified, like a feeding, a medication dose or an
/// upcoming vet appointment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// The `User` owning this `Reminder` and receiving its notifications
    pub user_id: ID,
    /// The pet this `Reminder` is about
    pub pet_id: ID,
    /// Notification headline, e.g. "Feed Nala"
    pub title: String,
    /// Notification text. When not set a generic fallback is used
    pub body: Option<String>,
    /// Free-form care instructions, forwarded in the notification payload
    pub instructions: Option<String>,
    /// Client defined category like "food", "medication" or "appointment"
    pub reminder_type: String,
    /// The timestamp at which this `Reminder` fired or will fire for the
    /// first time. This is never modified and anchors bare recurrence
    /// rules
    pub trigger_at: i64,
    /// The timestamp at which this `Reminder` is due next. Rolled forward
    /// to the following occurrence every time the reminder fires
    pub next_trigger_at: i64,
    /// Recurrence rule text like "FREQ=DAILY;INTERVAL=2", or "FREQ=NONE"
    /// for reminders that fire once
    pub recurrence_rule: String,
    /// Cleared when the recurrence is exhausted. Inactive `Reminder`s are
    /// never picked up again
    pub is_active: bool,
}

impl Reminder {
    pub fn new(
        user_id: ID,
        pet_id: ID,
        title: &str,
        reminder_type: &str,
        trigger_at: i64,
        recurrence_rule: &str,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            pet_id,
            title: title.into(),
            body: None,
            instructions: None,
            reminder_type: reminder_type.into(),
            trigger_at,
            next_trigger_at: trigger_at,
            recurrence_rule: recurrence_rule.into(),
            is_active: true,
        }
    }
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}
