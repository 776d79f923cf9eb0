//! Aggregated player statistics read by challenge progress rules

use crate::models::StatKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only aggregate recomputed from quest instances and social data.
///
/// Every field defaults to zero so partially populated snapshots stay valid
/// rule inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerStatsSnapshot {
    pub total_completed: u32,
    pub location_completed: u32,
    pub social_completed: u32,
    pub scan_completed: u32,
    pub friend_count: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub unique_cards: u32,
    pub total_xp: u32,
    pub completed_quest_ids: BTreeSet<String>,
}

impl PlayerStatsSnapshot {
    pub fn stat(&self, key: StatKey) -> u32 {
        match key {
            StatKey::TotalCompleted => self.total_completed,
            StatKey::LocationCompleted => self.location_completed,
            StatKey::SocialCompleted => self.social_completed,
            StatKey::ScanCompleted => self.scan_completed,
            StatKey::FriendCount => self.friend_count,
            StatKey::CurrentStreak => self.current_streak,
            StatKey::LongestStreak => self.longest_streak,
            StatKey::UniqueCards => self.unique_cards,
            StatKey::TotalXp => self.total_xp,
        }
    }

    pub fn has_completed(&self, quest_id: &str) -> bool {
        self.completed_quest_ids.contains(quest_id)
    }
}

/// Social side of the snapshot, from `GET /users/{uid}/social`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialStats {
    #[serde(alias = "friends", alias = "friend_count")]
    pub friend_count: u32,
    #[serde(alias = "cards", alias = "unique_cards")]
    pub unique_cards: u32,
}
