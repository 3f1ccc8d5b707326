use std::collections::HashMap;

/// Delivery urgency forwarded to the platform push channels
#[derive(Debug, Clone, PartialEq)]
pub enum PushPriority {
    Normal,
    High,
}

/// A push notification addressed to all devices of one `User`, before it
/// is translated into the delivery service wire format
#[derive(Debug, Clone)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Extra key value pairs handed to the receiving app
    pub data: HashMap<String, String>,
    pub priority: PushPriority,
    pub sound: Option<String>,
}

/// Delivery outcome for a single device token
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// Error identifier reported by the delivery service, `None` when the
    /// message was accepted for this token
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn success() -> Self {
        Self { error: None }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one multicast send. `outcomes` is aligned with the token
/// list the notification was sent to.
#[derive(Debug, Clone)]
pub struct MulticastSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub outcomes: Vec<SendOutcome>,
}

impl MulticastSummary {
    pub fn new(outcomes: Vec<SendOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            success_count,
            failure_count: outcomes.len() - success_count,
            outcomes,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_outcomes() {
        let summary = MulticastSummary::new(vec![
            SendOutcome::success(),
            SendOutcome::failure("NotRegistered"),
            SendOutcome::success(),
        ]);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.outcomes.len(), 3);
    }
}
