mod fcm;

pub use fcm::{FcmRestApi, IPushService, InMemoryPushService};
