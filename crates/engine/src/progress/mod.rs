//! Progress Rule Evaluator
//!
//! Rules are pure and total: the same snapshot always yields the same
//! `Progress`, and a snapshot with missing fields (all zero) is still valid.

mod stats;

pub use stats::{compute_snapshot, StatsInputs};

use questlog_core::{ChallengeDefinition, PlayerStatsSnapshot, Progress, ProgressRule};

/// A definition paired with its freshly computed progress
#[derive(Debug, Clone, Copy)]
pub struct Evaluated<'a> {
    pub definition: &'a ChallengeDefinition,
    pub progress: Progress,
}

/// Evaluate one rule against a snapshot
pub fn evaluate(rule: &ProgressRule, stats: &PlayerStatsSnapshot) -> Progress {
    match rule {
        ProgressRule::Stat { stat, target } => Progress::new(stats.stat(*stat), *target),
        ProgressRule::Questline { quests } => {
            // only the unbroken prefix counts
            let done = quests.iter().take_while(|q| stats.has_completed(q)).count();
            Progress::new(done as u32, rule.target())
        }
        ProgressRule::QuestSet { quests } => {
            let done = quests.iter().filter(|q| stats.has_completed(q)).count();
            Progress::new(done as u32, rule.target())
        }
    }
}

/// Evaluate every definition, preserving source order
pub fn evaluate_all<'a>(
    definitions: &'a [ChallengeDefinition],
    stats: &PlayerStatsSnapshot,
) -> Vec<Evaluated<'a>> {
    definitions
        .iter()
        .map(|definition| Evaluated {
            definition,
            progress: evaluate(&definition.rule, stats),
        })
        .collect()
}
