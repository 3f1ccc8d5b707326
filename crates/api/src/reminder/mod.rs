mod clean_invalid_tokens;
mod roll_over_reminder;
pub mod send_due_reminders;
