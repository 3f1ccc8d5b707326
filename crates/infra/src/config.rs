use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server key used to authorize calls to the push delivery service.
    /// All outgoing notifications are sent with this key.
    pub fcm_server_key: String,
}

impl Config {
    pub fn new() -> Self {
        let fcm_server_key = match std::env::var("FCM_SERVER_KEY") {
            Ok(key) => key,
            Err(_) => {
                warn!("Did not find FCM_SERVER_KEY environment variable. The push delivery service will reject every notification.");
                String::new()
            }
        };
        Self { fcm_server_key }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
