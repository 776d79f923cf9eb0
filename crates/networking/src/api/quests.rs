//! Quest API operations with validation

use super::challenges::require_id;
use crate::QuestBackend;
use questlog_core::{AdminOverride, Error, MutationReceipt, QuestStatus, Result, ScanResult};
use tracing::info;

/// Longest code a QR sticker can carry
const MAX_CODE_LEN: usize = 128;

pub async fn start_quest<B: QuestBackend + ?Sized>(backend: &B, quest_id: &str) -> Result<()> {
    require_id("quest", quest_id)?;
    info!("Starting quest {}", quest_id);
    backend.start_quest(quest_id).await
}

/// Redeem a scanned code
///
/// The code is trimmed before sending. Empty or oversized codes fail with
/// `ValidationError` without a remote call.
pub async fn redeem_scan_code<B: QuestBackend + ?Sized>(
    backend: &B,
    code: &str,
) -> Result<ScanResult> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::ValidationError("code is required".to_string()));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(Error::ValidationError(format!(
            "code is longer than {} characters",
            MAX_CODE_LEN
        )));
    }

    info!("Redeeming scanned code");
    backend.redeem_scan_code(code).await
}

/// Apply an admin override to another player's quest
///
/// `Reset` needs the status the quest is currently held in; it is ignored for
/// the other overrides.
pub async fn override_quest<B: QuestBackend + ?Sized>(
    backend: &B,
    user_id: &str,
    quest_id: &str,
    action: AdminOverride,
    current: QuestStatus,
) -> Result<MutationReceipt> {
    require_id("user", user_id)?;
    require_id("quest", quest_id)?;

    info!("Admin {} quest {} for user {}", action, quest_id, user_id);
    match action {
        AdminOverride::Complete => backend.admin_complete_quest(user_id, quest_id).await,
        AdminOverride::Uncomplete => backend.admin_uncomplete_quest(user_id, quest_id).await,
        AdminOverride::Reset => {
            if current == QuestStatus::Available {
                return Err(Error::InvalidTransition {
                    action: "reset quest".to_string(),
                    from: current.to_string(),
                });
            }
            backend.admin_reset_quest(user_id, quest_id, current).await
        }
    }
}
