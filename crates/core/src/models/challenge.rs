//! Event challenge definitions, per-player records, and the merged view

use crate::models::quest::id_to_string;
use crate::{Error, Result, Xp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated player statistic a rule can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    TotalCompleted,
    LocationCompleted,
    SocialCompleted,
    ScanCompleted,
    FriendCount,
    CurrentStreak,
    LongestStreak,
    UniqueCards,
    TotalXp,
}

impl StatKey {
    /// Parse a backend metric name. Case and `_` are ignored.
    pub fn from_metric(name: &str) -> Option<StatKey> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect();

        match key.as_str() {
            "totalcompleted" | "questscompleted" | "completedquests" => {
                Some(StatKey::TotalCompleted)
            }
            "locationcompleted" | "locationquests" => Some(StatKey::LocationCompleted),
            "socialcompleted" | "socialquests" => Some(StatKey::SocialCompleted),
            "scancompleted" | "scanquests" => Some(StatKey::ScanCompleted),
            "friendcount" | "friends" => Some(StatKey::FriendCount),
            "currentstreak" | "streak" => Some(StatKey::CurrentStreak),
            "longeststreak" => Some(StatKey::LongestStreak),
            "uniquecards" | "cards" | "cardscollected" => Some(StatKey::UniqueCards),
            "totalxp" | "xp" => Some(StatKey::TotalXp),
            _ => None,
        }
    }
}

/// Declarative progress rule evaluated against a stats snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressRule {
    /// Reach `target` on one statistic
    Stat { stat: StatKey, target: u32 },
    /// Complete the quests in the listed order
    Questline { quests: Vec<String> },
    /// Complete all listed quests in any order
    QuestSet { quests: Vec<String> },
}

impl ProgressRule {
    pub fn target(&self) -> u32 {
        match self {
            ProgressRule::Stat { target, .. } => *target,
            ProgressRule::Questline { quests } | ProgressRule::QuestSet { quests } => {
                quests.len() as u32
            }
        }
    }

    fn validate(&self, challenge_id: &str) -> Result<()> {
        if self.target() == 0 {
            return Err(Error::ValidationError(format!(
                "challenge {} has a zero target",
                challenge_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeMode {
    #[default]
    Simple,
    Questline,
}

/// Where a physical card can be picked up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimLocation {
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeReward {
    pub xp: Xp,
    /// Collectible card unlocked on claim
    pub card_id: Option<String>,
    pub claim_location: Option<ClaimLocation>,
}

/// Immutable challenge template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub rule: ProgressRule,
    pub reward: ChallengeReward,
    #[serde(default)]
    pub mode: ChallengeMode,
}

/// Persisted per-player challenge status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Claimed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::NotStarted => "not_started",
            ChallengeStatus::InProgress => "in_progress",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Claimed => "claimed",
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChallengeRecord {
    pub challenge_id: String,
    pub status: ChallengeStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl UserChallengeRecord {
    pub fn new(challenge_id: impl Into<String>, status: ChallengeStatus) -> Self {
        Self {
            challenge_id: challenge_id.into(),
            status,
            started_at: None,
            completed_at: None,
            claimed_at: None,
        }
    }
}

/// Output of rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// May exceed `target`
    pub current: u32,
    pub target: u32,
}

impl Progress {
    pub fn new(current: u32, target: u32) -> Self {
        Self { current, target }
    }

    pub fn is_completed(&self) -> bool {
        self.current >= self.target
    }
}

/// Display bucket, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewGroup {
    /// Completed but not yet claimed
    Claimable,
    InProgress,
    Done,
}

/// Definition + computed progress + stored status, folded for the UI.
///
/// Never persisted. `is_claimed` implies `is_completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub definition: ChallengeDefinition,
    pub progress: Progress,
    /// Stored status, `NotStarted` when the player has no record
    pub status: ChallengeStatus,
    pub is_completed: bool,
    pub is_claimed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl ChallengeView {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn group(&self) -> ViewGroup {
        if self.is_claimed {
            ViewGroup::Done
        } else if self.is_completed {
            ViewGroup::Claimable
        } else {
            ViewGroup::InProgress
        }
    }

    pub fn is_claimable(&self) -> bool {
        self.is_completed && !self.is_claimed
    }

    /// Context passed along with a claim request
    pub fn claim_context(&self) -> ClaimContext {
        ClaimContext {
            challenge_id: self.definition.id.clone(),
            title: self.definition.title.clone(),
            card_id: self.definition.reward.card_id.clone(),
            claim_location: self.definition.reward.claim_location.clone(),
            progress: self.progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimContext {
    pub challenge_id: String,
    pub title: String,
    pub card_id: Option<String>,
    pub claim_location: Option<ClaimLocation>,
    pub progress: Progress,
}

// ─── Wire payloads ───────────────────────────────────────────────────

/// Challenge as served by `GET /events/challenges`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengePayload {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rule: Option<ProgressRule>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub stat: Option<String>,
    #[serde(default)]
    pub target: Option<u32>,
    #[serde(default)]
    pub quest_ids: Option<Vec<serde_json::Value>>,
    #[serde(default, rename = "questIds")]
    pub quest_ids_camel: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub mode: Option<ChallengeMode>,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub xp_reward: Option<i64>,
    #[serde(default, rename = "xpReward")]
    pub xp_reward_camel: Option<i64>,
    #[serde(default)]
    pub card_id: Option<serde_json::Value>,
    #[serde(default, rename = "cardId")]
    pub card_id_camel: Option<serde_json::Value>,
    #[serde(default)]
    pub reward_card_id: Option<serde_json::Value>,
    #[serde(default, alias = "claimLocation")]
    pub claim_location: Option<ClaimLocation>,
}

impl ChallengePayload {
    pub fn normalize(self) -> Result<ChallengeDefinition> {
        let id = self
            .id
            .as_ref()
            .map(id_to_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ValidationError("challenge without id".to_string()))?;

        let quest_ids: Option<Vec<String>> = self
            .quest_ids
            .or(self.quest_ids_camel)
            .map(|ids| ids.iter().map(id_to_string).filter(|q| !q.is_empty()).collect());

        let mode = self.mode.unwrap_or(match quest_ids {
            Some(_) => ChallengeMode::Questline,
            None => ChallengeMode::Simple,
        });

        let rule = match (self.rule, quest_ids) {
            (Some(rule), _) => rule,
            (None, Some(quests)) if mode == ChallengeMode::Questline => {
                ProgressRule::Questline { quests }
            }
            (None, Some(quests)) => ProgressRule::QuestSet { quests },
            (None, None) => {
                let metric = self.metric.or(self.stat).ok_or_else(|| {
                    Error::ValidationError(format!("challenge {} has no progress rule", id))
                })?;
                let stat = StatKey::from_metric(&metric).ok_or_else(|| {
                    Error::ValidationError(format!(
                        "challenge {} uses unknown metric '{}'",
                        id, metric
                    ))
                })?;
                ProgressRule::Stat {
                    stat,
                    target: self.target.unwrap_or(0),
                }
            }
        };
        rule.validate(&id)?;

        let card_id = self
            .card_id
            .or(self.card_id_camel)
            .or(self.reward_card_id)
            .map(|v| id_to_string(&v))
            .filter(|c| !c.is_empty());

        Ok(ChallengeDefinition {
            title: self.title.or(self.name).unwrap_or_else(|| id.clone()),
            id,
            description: self.description.unwrap_or_default(),
            rule,
            reward: ChallengeReward {
                xp: Xp(self.xp.or(self.xp_reward).or(self.xp_reward_camel).unwrap_or(0)),
                card_id,
                claim_location: self.claim_location,
            },
            mode,
        })
    }
}

/// Record as served by `GET /events/challenges/me`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChallengePayload {
    #[serde(default)]
    pub challenge_id: Option<serde_json::Value>,
    #[serde(default, rename = "challengeId")]
    pub challenge_id_camel: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<ChallengeStatus>,
    #[serde(default)]
    pub is_claimed: Option<bool>,
    #[serde(default)]
    pub claimed: Option<bool>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub started: Option<bool>,
    #[serde(default, alias = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "claimedAt")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl UserChallengePayload {
    pub fn normalize(self) -> Result<UserChallengeRecord> {
        let challenge_id = self
            .challenge_id
            .as_ref()
            .or(self.challenge_id_camel.as_ref())
            .map(id_to_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ValidationError("challenge record without id".to_string()))?;

        let status = match self.status {
            Some(status) => status,
            None if self.is_claimed.or(self.claimed).unwrap_or(false) => ChallengeStatus::Claimed,
            None if self.is_completed.or(self.completed).unwrap_or(false) => {
                ChallengeStatus::Completed
            }
            None if self.started.unwrap_or(false) || self.started_at.is_some() => {
                ChallengeStatus::InProgress
            }
            None => ChallengeStatus::NotStarted,
        };

        Ok(UserChallengeRecord {
            challenge_id,
            status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            claimed_at: self.claimed_at,
        })
    }
}
