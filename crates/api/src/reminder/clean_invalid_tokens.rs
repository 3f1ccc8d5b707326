use eppets_scheduler_domain::{SendOutcome, ID};
use eppets_scheduler_infra::EppetsContext;
use futures::future::join_all;
use tracing::{info, warn};

/// Error identifiers from the push delivery service that mean a device
/// token will never work again: the token is malformed, its registration
/// was removed or expired, or it belongs to another sender configuration.
/// Transient errors like exceeded quotas are not in this list.
const PERMANENT_DELIVERY_ERRORS: [&str; 3] =
    ["InvalidRegistration", "NotRegistered", "MismatchSenderId"];

fn is_permanently_invalid(outcome: &SendOutcome) -> bool {
    match &outcome.error {
        Some(error) => PERMANENT_DELIVERY_ERRORS.contains(&error.as_str()),
        None => false,
    }
}

/// Deletes the device tokens that the delivery service reported as
/// permanently invalid, so they are not multicast to again. `outcomes` is
/// aligned with `device_tokens`. Deletions are best effort, a failed one
/// is picked up again after the next send.
pub async fn clean_invalid_tokens(
    outcomes: &[SendOutcome],
    device_tokens: &[String],
    user_id: &ID,
    ctx: &EppetsContext,
) {
    let invalid_tokens = outcomes
        .iter()
        .zip(device_tokens.iter())
        .filter(|(outcome, _)| is_permanently_invalid(outcome))
        .map(|(_, token)| token)
        .collect::<Vec<_>>();
    if invalid_tokens.is_empty() {
        return;
    }

    join_all(invalid_tokens.iter().map(|token| async move {
        if ctx
            .repos
            .device_tokens
            .delete(user_id, token)
            .await
            .is_none()
        {
            warn!(
                "Unable to delete invalid device token {} for user {}",
                token, user_id
            );
        }
    }))
    .await;

    info!(
        "Deleted {} invalid device tokens for user {}",
        invalid_tokens.len(),
        user_id
    );
}
