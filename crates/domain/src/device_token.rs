use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Android,
    Ios,
    Web,
}

impl Default for DevicePlatform {
    fn default() -> Self {
        Self::Android
    }
}

impl Display for DevicePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let platform = match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        };
        write!(f, "{}", platform)
    }
}

impl FromStr for DevicePlatform {
    type Err = ();

    fn from_str(platform: &str) -> Result<Self, Self::Err> {
        match platform.to_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            "web" => Ok(Self::Web),
            _ => Err(()),
        }
    }
}

/// A push messaging token registered by one of a `User`s devices at login.
/// A `User` can be logged in on any number of devices at once.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceToken {
    pub user_id: ID,
    pub token: String,
    pub platform: DevicePlatform,
}

impl DeviceToken {
    pub fn new(user_id: ID, token: &str, platform: DevicePlatform) -> Self {
        Self {
            user_id,
            token: token.into(),
            platform,
        }
    }
}
