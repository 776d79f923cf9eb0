//! Remote collaborator contract
//!
//! Everything the quest log needs from the backend. The backend owns quest
//! instances and challenge records; the client only ever holds a cached copy.

use async_trait::async_trait;
use questlog_core::{
    ChallengeDefinition, ClaimContext, LeaderboardEntry, MutationReceipt, QuestDefinition,
    QuestInstance, QuestStatus, Result, ScanResult, SocialStats, UserChallengeRecord,
    UserProfile, Xp,
};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QuestBackend: Send + Sync {
    /// Profile of the signed-in player
    async fn fetch_session(&self) -> Result<UserProfile>;

    async fn fetch_event_challenges(&self) -> Result<Vec<ChallengeDefinition>>;

    /// Records for the signed-in player only
    async fn fetch_user_event_challenges(&self) -> Result<Vec<UserChallengeRecord>>;

    async fn start_challenge(&self, challenge_id: &str) -> Result<()>;

    async fn claim_event_challenge(
        &self,
        challenge_id: &str,
        xp_amount: Xp,
        context: &ClaimContext,
    ) -> Result<MutationReceipt>;

    async fn admin_complete_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt>;

    async fn admin_uncomplete_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt>;

    async fn admin_reset_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<MutationReceipt>;

    async fn fetch_quest_definitions(&self) -> Result<Vec<QuestDefinition>>;

    async fn fetch_user_quests(&self, user_id: &str) -> Result<Vec<QuestInstance>>;

    async fn start_quest(&self, quest_id: &str) -> Result<()>;

    /// Redeem a scanned QR code against whichever quest it belongs to
    async fn redeem_scan_code(&self, code: &str) -> Result<ScanResult>;

    async fn admin_complete_quest(&self, user_id: &str, quest_id: &str) -> Result<MutationReceipt>;

    async fn admin_uncomplete_quest(
        &self,
        user_id: &str,
        quest_id: &str,
    ) -> Result<MutationReceipt>;

    /// Reset a quest the player holds in `status`
    async fn admin_reset_quest(
        &self,
        user_id: &str,
        quest_id: &str,
        status: QuestStatus,
    ) -> Result<MutationReceipt>;

    async fn fetch_social_stats(&self, user_id: &str) -> Result<SocialStats>;

    async fn fetch_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>>;
}
