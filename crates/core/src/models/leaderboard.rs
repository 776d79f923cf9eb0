//! Leaderboard models

use serde::{Deserialize, Serialize};

/// Leaderboard response from `GET /leaderboard`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default, alias = "leaderboard", alias = "players")]
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(alias = "user_id")]
    pub user_id: serde_json::Value,
    pub username: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, alias = "total_xp", alias = "totalXp")]
    pub xp: serde_json::Value,
    #[serde(default, alias = "quests_completed")]
    pub quests_completed: serde_json::Value,
}

fn parse_u64(v: &serde_json::Value) -> u64 {
    match v {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

impl LeaderboardEntry {
    pub fn user_id_str(&self) -> String {
        crate::models::id_to_string(&self.user_id)
    }

    pub fn xp_u64(&self) -> u64 {
        parse_u64(&self.xp)
    }

    pub fn quests_completed_u64(&self) -> u64 {
        parse_u64(&self.quests_completed)
    }
}

/// 1-based rank of `user_id` after sorting by XP (ties keep server order)
pub fn rank_of(entries: &[LeaderboardEntry], user_id: &str) -> Option<usize> {
    let mut ranked: Vec<&LeaderboardEntry> = entries.iter().collect();
    ranked.sort_by(|a, b| b.xp_u64().cmp(&a.xp_u64()));
    ranked
        .iter()
        .position(|e| e.user_id_str() == user_id)
        .map(|i| i + 1)
}
