//! Quest log state and its reducer
//!
//! State is an immutable snapshot. Every change goes through [`reduce`], which
//! returns the next snapshot and leaves the previous one untouched.

use crate::progress::{compute_snapshot, evaluate_all, StatsInputs};
use crate::reconcile::{merge, sort_for_display};
use chrono::{DateTime, Utc};
use questlog_core::{
    Caller, ChallengeDefinition, ChallengeView, Error, PlayerStatsSnapshot, QuestDefinition,
    QuestInstance, QuestStatus, Result, SocialStats, UserChallengeRecord, UserProfile, ViewGroup,
};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestLogState {
    /// Bumped by every reduction
    pub revision: u64,
    /// Sequence number of the fetch the view was built from
    pub generation: u64,
    pub profile: Option<UserProfile>,
    pub quest_definitions: Vec<QuestDefinition>,
    pub quests: Vec<QuestInstance>,
    pub stats: PlayerStatsSnapshot,
    /// Merged views in display order
    pub challenges: Vec<ChallengeView>,
    /// Challenge ids known to be claimed. Survives re-ingestion.
    pub claimed: BTreeSet<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl QuestLogState {
    /// Whether a fetch started as `generation` is newer than the applied one
    pub fn accepts(&self, generation: u64) -> bool {
        generation > self.generation
    }

    pub fn challenge(&self, challenge_id: &str) -> Option<&ChallengeView> {
        self.challenges.iter().find(|c| c.id() == challenge_id)
    }

    pub fn quest(&self, quest_id: &str) -> Option<&QuestInstance> {
        self.quests.iter().find(|q| q.quest_id == quest_id)
    }

    /// Status the player holds a quest in. A defined quest without an
    /// instance is `Available`.
    pub fn quest_status(&self, quest_id: &str) -> Result<QuestStatus> {
        if let Some(instance) = self.quest(quest_id) {
            return Ok(instance.status);
        }
        if self.quest_definitions.iter().any(|d| d.id == quest_id) {
            return Ok(QuestStatus::Available);
        }
        Err(Error::NotFound(format!("quest {}", quest_id)))
    }

    pub fn caller(&self) -> Result<Caller> {
        self.profile
            .as_ref()
            .map(UserProfile::caller)
            .ok_or_else(|| Error::Unauthorized("not signed in".to_string()))
    }

    pub fn active_quests(&self) -> Vec<&QuestInstance> {
        self.quests
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
            .collect()
    }

    pub fn completed_quests(&self) -> Vec<&QuestInstance> {
        self.quests.iter().filter(|q| q.is_completed()).collect()
    }

    pub fn challenges_in(&self, group: ViewGroup) -> impl Iterator<Item = &ChallengeView> {
        self.challenges.iter().filter(move |c| c.group() == group)
    }

    pub fn claimable_count(&self) -> usize {
        self.challenges_in(ViewGroup::Claimable).count()
    }
}

/// Everything one full fetch returned
#[derive(Debug, Clone)]
pub struct IngestBatch {
    pub profile: UserProfile,
    pub challenge_definitions: Vec<ChallengeDefinition>,
    pub records: Vec<UserChallengeRecord>,
    pub quest_definitions: Vec<QuestDefinition>,
    pub quests: Vec<QuestInstance>,
    pub social: SocialStats,
    pub fetched_at: DateTime<Utc>,
    /// Start sequence number of the fetch
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum QuestLogAction {
    /// Replace the view with a fresh fetch. `revoked` are claims an admin
    /// removed before this fetch started.
    Ingested {
        batch: IngestBatch,
        revoked: BTreeSet<String>,
    },
    /// The session is gone
    Cleared,
}

/// Next state. A batch from a fetch older than the applied one is ignored and
/// the state comes back unchanged.
pub fn reduce(state: &QuestLogState, action: QuestLogAction) -> QuestLogState {
    let revision = state.revision + 1;

    match action {
        QuestLogAction::Ingested { batch, .. } if !state.accepts(batch.generation) => {
            debug!(
                generation = batch.generation,
                applied = state.generation,
                "Ignoring superseded fetch"
            );
            state.clone()
        }
        QuestLogAction::Ingested { batch, revoked } => ingest(state, batch, &revoked, revision),
        QuestLogAction::Cleared => QuestLogState {
            revision,
            generation: state.generation,
            ..Default::default()
        },
    }
}

fn ingest(
    state: &QuestLogState,
    batch: IngestBatch,
    revoked: &BTreeSet<String>,
    revision: u64,
) -> QuestLogState {
    // sticky claims belong to one player
    let same_player = state
        .profile
        .as_ref()
        .map_or(false, |p| p.id == batch.profile.id);
    let mut claimed: BTreeSet<String> = if same_player {
        state.claimed.difference(revoked).cloned().collect()
    } else {
        BTreeSet::new()
    };

    let stats = compute_snapshot(
        StatsInputs {
            quests: &batch.quests,
            definitions: &batch.quest_definitions,
            social: &batch.social,
        },
        batch.fetched_at.date_naive(),
    );

    let evaluated = evaluate_all(&batch.challenge_definitions, &stats);
    let mut challenges = merge(&evaluated, &batch.records, &claimed);
    sort_for_display(&mut challenges);

    claimed.extend(
        challenges
            .iter()
            .filter(|c| c.is_claimed)
            .map(|c| c.id().to_string()),
    );

    debug!(
        revision,
        challenges = challenges.len(),
        quests = batch.quests.len(),
        claimed = claimed.len(),
        "Ingested quest log"
    );

    QuestLogState {
        revision,
        generation: batch.generation,
        profile: Some(batch.profile),
        quest_definitions: batch.quest_definitions,
        quests: batch.quests,
        stats,
        challenges,
        claimed,
        refreshed_at: Some(batch.fetched_at),
    }
}
