//! Per-record state machine
//!
//! These checks run before a mutation is sent. They never produce the
//! post-mutation state for display; the view always comes from a re-fetch.

use questlog_core::{
    AdminOverride, Caller, ChallengeStatus, ChallengeView, Error, QuestStatus, Result,
};

fn invalid(action: impl Into<String>, from: impl std::fmt::Display) -> Error {
    Error::InvalidTransition {
        action: action.into(),
        from: from.to_string(),
    }
}

/// `not_started -> in_progress`
pub fn start_challenge(challenge_id: &str, status: ChallengeStatus) -> Result<ChallengeStatus> {
    match status {
        ChallengeStatus::NotStarted => Ok(ChallengeStatus::InProgress),
        _ => Err(Error::AlreadyStarted(challenge_id.to_string())),
    }
}

/// `completed && !claimed -> claimed`
pub fn claim_challenge(view: &ChallengeView) -> Result<ChallengeStatus> {
    if view.is_claimable() {
        Ok(ChallengeStatus::Claimed)
    } else {
        Err(Error::NotClaimable(view.id().to_string()))
    }
}

pub fn authorize_admin(caller: &Caller, action: AdminOverride) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(Error::Unauthorized(format!(
            "user {} may not {}",
            caller.user_id, action
        )))
    }
}

/// Admin side channel for challenges
pub fn admin_challenge(status: ChallengeStatus, action: AdminOverride) -> Result<ChallengeStatus> {
    match (action, status) {
        (AdminOverride::Complete, ChallengeStatus::Claimed) => {
            Err(invalid("complete challenge", status))
        }
        (AdminOverride::Complete, _) => Ok(ChallengeStatus::Completed),
        (AdminOverride::Uncomplete, ChallengeStatus::Completed | ChallengeStatus::Claimed) => {
            Ok(ChallengeStatus::NotStarted)
        }
        (AdminOverride::Uncomplete, _) => Err(invalid("uncomplete challenge", status)),
        (AdminOverride::Reset, _) => Ok(ChallengeStatus::NotStarted),
    }
}

/// `available -> active`
pub fn start_quest(quest_id: &str, status: QuestStatus) -> Result<QuestStatus> {
    match status {
        QuestStatus::Available => Ok(QuestStatus::Active),
        _ => Err(Error::AlreadyStarted(quest_id.to_string())),
    }
}

/// Admin side channel for quests.
///
/// Reset is sent with the status held locally. Only a `completed` quest carries
/// XP to deduct, and after a reset it re-fetches as `available`, so a second
/// reset fails here instead of deducting twice.
pub fn admin_quest(status: QuestStatus, action: AdminOverride) -> Result<QuestStatus> {
    match (action, status) {
        (AdminOverride::Complete, QuestStatus::Completed) => Err(invalid("complete quest", status)),
        (AdminOverride::Complete, _) => Ok(QuestStatus::Completed),
        (AdminOverride::Uncomplete, QuestStatus::Completed) => Ok(QuestStatus::Active),
        (AdminOverride::Uncomplete, _) => Err(invalid("uncomplete quest", status)),
        (AdminOverride::Reset, QuestStatus::Available) => Err(invalid("reset quest", status)),
        (AdminOverride::Reset, _) => Ok(QuestStatus::Available),
    }
}
