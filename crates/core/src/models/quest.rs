//! Quest definitions and per-player quest instances

use crate::{Error, Gems, Result, Xp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a quest is progressed in the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    /// Visit a place on the map
    Location,
    /// Interact with friends
    Social,
    /// Scan a QR code
    Scan,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Location => "location",
            QuestType::Social => "social",
            QuestType::Scan => "scan",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Reward paid out when a quest completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReward {
    pub xp: Xp,
    pub gems: Gems,
}

/// Immutable quest template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward: QuestReward,
    pub quest_type: QuestType,
    pub target: u32,
    pub difficulty: Difficulty,
}

/// Where a player stands on a quest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Available,
    Active,
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Available => "available",
            QuestStatus::Active => "active",
            QuestStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A player's relationship to one quest definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestInstance {
    pub quest_id: String,
    pub status: QuestStatus,
    pub progress: u32,
    pub target: u32,
    /// Only set when the backend embeds it; otherwise resolved from the definition
    pub quest_type: Option<QuestType>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// XP the backend recorded for this instance
    pub xp_awarded: Xp,
}

impl QuestInstance {
    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }
}

// ─── Wire payloads ───────────────────────────────────────────────────
//
// Older backend versions used several names for the same field. Every alias is
// captured here and collapsed once, so nothing past this point sees them.

/// Quest definition as served by `GET /quests`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestPayload {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub quest_type: Option<QuestType>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub xp_reward: Option<i64>,
    #[serde(default, rename = "xpReward")]
    pub xp_reward_camel: Option<i64>,
    #[serde(default)]
    pub gems: Option<u32>,
    #[serde(default)]
    pub gem_reward: Option<u32>,
    #[serde(default, rename = "gemReward")]
    pub gem_reward_camel: Option<u32>,
    #[serde(default)]
    pub target: Option<u32>,
    #[serde(default)]
    pub target_count: Option<u32>,
    #[serde(default, rename = "targetCount")]
    pub target_count_camel: Option<u32>,
}

impl QuestPayload {
    /// Collapse aliases into the canonical definition
    pub fn normalize(self) -> Result<QuestDefinition> {
        let id = self
            .id
            .as_ref()
            .map(id_to_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ValidationError("quest without id".to_string()))?;

        let quest_type = self
            .quest_type
            .ok_or_else(|| Error::ValidationError(format!("quest {} has no type", id)))?;

        let xp = self.xp.or(self.xp_reward).or(self.xp_reward_camel).unwrap_or(0);
        let gems = self
            .gems
            .or(self.gem_reward)
            .or(self.gem_reward_camel)
            .unwrap_or(0);
        let target = self
            .target
            .or(self.target_count)
            .or(self.target_count_camel)
            .unwrap_or(1)
            .max(1);

        Ok(QuestDefinition {
            title: self.title.or(self.name).unwrap_or_else(|| id.clone()),
            id,
            description: self.description.unwrap_or_default(),
            reward: QuestReward {
                xp: Xp(xp),
                gems: Gems(gems),
            },
            quest_type,
            target,
            difficulty: self.difficulty.unwrap_or_default(),
        })
    }
}

/// Quest instance as served by `GET /users/{uid}/quests`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestInstancePayload {
    #[serde(default)]
    pub quest_id: Option<serde_json::Value>,
    #[serde(default, rename = "questId")]
    pub quest_id_camel: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<QuestStatus>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub target: Option<u32>,
    #[serde(default, rename = "type")]
    pub quest_type: Option<QuestType>,
    #[serde(default, alias = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "xpAwarded")]
    pub xp_awarded: Option<i64>,
}

impl QuestInstancePayload {
    pub fn normalize(self) -> Result<QuestInstance> {
        let quest_id = self
            .quest_id
            .as_ref()
            .or(self.quest_id_camel.as_ref())
            .map(id_to_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ValidationError("quest instance without quest id".to_string()))?;

        let status = match self.status {
            Some(status) => status,
            None if self.completed.or(self.is_completed).unwrap_or(false) => QuestStatus::Completed,
            None => QuestStatus::Active,
        };

        let target = self.target.unwrap_or(1).max(1);
        let progress = match status {
            QuestStatus::Completed => self.progress.unwrap_or(target).max(target),
            _ => self.progress.unwrap_or(0),
        };

        Ok(QuestInstance {
            quest_id,
            status,
            progress,
            target,
            quest_type: self.quest_type,
            started_at: self.started_at,
            completed_at: self.completed_at,
            xp_awarded: Xp(self.xp_awarded.unwrap_or(0)),
        })
    }
}

/// Result of redeeming a scanned code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub quest_id: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub xp_awarded: Xp,
    #[serde(default)]
    pub error: Option<String>,
}

/// Ids arrive as numbers from some endpoints and strings from others
pub fn id_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_reward_names_collapse() {
        let payload: QuestPayload = serde_json::from_value(json!({
            "id": 12,
            "name": "Find the fountain",
            "type": "location",
            "xpReward": 150,
            "gem_reward": 3,
            "targetCount": 2
        }))
        .unwrap();

        let quest = payload.normalize().unwrap();
        assert_eq!(quest.id, "12");
        assert_eq!(quest.title, "Find the fountain");
        assert_eq!(quest.reward.xp, Xp(150));
        assert_eq!(quest.reward.gems, Gems(3));
        assert_eq!(quest.target, 2);
        assert_eq!(quest.difficulty, Difficulty::Easy);
    }

    #[test]
    fn canonical_name_wins_over_aliases() {
        let payload: QuestPayload = serde_json::from_value(json!({
            "id": "q1", "type": "scan", "xp": 10, "xp_reward": 99
        }))
        .unwrap();
        assert_eq!(payload.normalize().unwrap().reward.xp, Xp(10));
    }

    #[test]
    fn quest_without_id_is_rejected() {
        let payload: QuestPayload =
            serde_json::from_value(json!({ "type": "social", "xp": 5 })).unwrap();
        assert!(matches!(payload.normalize(), Err(Error::ValidationError(_))));
    }

    #[test]
    fn instance_status_falls_back_to_completed_flag() {
        let payload: QuestInstancePayload = serde_json::from_value(json!({
            "questId": "q7",
            "is_completed": true,
            "target": 3,
            "xpAwarded": 40
        }))
        .unwrap();

        let instance = payload.normalize().unwrap();
        assert_eq!(instance.quest_id, "q7");
        assert_eq!(instance.status, QuestStatus::Completed);
        assert_eq!(instance.progress, 3);
        assert_eq!(instance.xp_awarded, Xp(40));
    }
}
