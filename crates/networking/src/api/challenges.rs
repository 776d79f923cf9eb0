//! Challenge API operations with validation

use crate::QuestBackend;
use questlog_core::{AdminOverride, ChallengeView, Error, MutationReceipt, Result};
use tracing::{info, warn};

pub(crate) fn require_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::ValidationError(format!("{} id is required", kind)));
    }
    Ok(())
}

/// Start a challenge by id
pub async fn start_challenge<B: QuestBackend + ?Sized>(
    backend: &B,
    challenge_id: &str,
) -> Result<()> {
    require_id("challenge", challenge_id)?;
    info!("Starting challenge {}", challenge_id);
    backend.start_challenge(challenge_id).await
}

/// Claim the reward for a merged challenge view
///
/// Sends the definition's XP and the claim context (card + pickup location).
/// Whether the view is claimable is checked by the caller; this only guards
/// the request shape.
pub async fn claim_challenge<B: QuestBackend + ?Sized>(
    backend: &B,
    view: &ChallengeView,
) -> Result<MutationReceipt> {
    require_id("challenge", view.id())?;

    let xp = view.definition.reward.xp;
    if xp.as_i64() < 0 {
        return Err(Error::ValidationError(format!(
            "challenge {} has a negative reward",
            view.id()
        )));
    }

    info!("Claiming challenge {} for {}", view.id(), xp);
    let receipt = backend
        .claim_event_challenge(view.id(), xp, &view.claim_context())
        .await?;

    if receipt.xp_awarded != xp {
        warn!(
            "Challenge {} awarded {} but definition promised {}",
            view.id(),
            receipt.xp_awarded,
            xp
        );
    }
    Ok(receipt)
}

/// Apply an admin override to another player's challenge
pub async fn override_challenge<B: QuestBackend + ?Sized>(
    backend: &B,
    user_id: &str,
    challenge_id: &str,
    action: AdminOverride,
) -> Result<MutationReceipt> {
    require_id("user", user_id)?;
    require_id("challenge", challenge_id)?;

    info!("Admin {} challenge {} for user {}", action, challenge_id, user_id);
    match action {
        AdminOverride::Complete => {
            backend.admin_complete_challenge(user_id, challenge_id).await
        }
        AdminOverride::Uncomplete => {
            backend.admin_uncomplete_challenge(user_id, challenge_id).await
        }
        AdminOverride::Reset => backend.admin_reset_challenge(user_id, challenge_id).await,
    }
}
