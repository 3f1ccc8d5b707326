mod device_token;
mod notification;
mod reminder;
mod shared;

pub use device_token::{DevicePlatform, DeviceToken};
pub use notification::{MulticastSummary, PushNotification, PushPriority, SendOutcome};
pub use reminder::Reminder;
pub use shared::entity::{Entity, ID};
pub use shared::recurrence::{
    InvalidRecurrenceError, RecurrenceFrequency, RecurrenceSpec, WeekDay,
};
