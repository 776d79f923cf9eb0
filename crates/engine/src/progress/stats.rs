//! Derivation of the player stats snapshot from quests and social data

use chrono::NaiveDate;
use questlog_core::{
    PlayerStatsSnapshot, QuestDefinition, QuestInstance, QuestType, SocialStats, Xp,
};
use std::collections::{BTreeSet, HashMap};

/// Everything the snapshot is computed from
#[derive(Debug, Clone, Copy)]
pub struct StatsInputs<'a> {
    pub quests: &'a [QuestInstance],
    pub definitions: &'a [QuestDefinition],
    pub social: &'a SocialStats,
}

/// Recompute the snapshot. `today` anchors the current streak.
pub fn compute_snapshot(inputs: StatsInputs<'_>, today: NaiveDate) -> PlayerStatsSnapshot {
    let types: HashMap<&str, QuestType> = inputs
        .definitions
        .iter()
        .map(|d| (d.id.as_str(), d.quest_type))
        .collect();

    let mut snapshot = PlayerStatsSnapshot {
        friend_count: inputs.social.friend_count,
        unique_cards: inputs.social.unique_cards,
        ..Default::default()
    };

    let mut total_xp = Xp::ZERO;
    let mut completion_days = BTreeSet::new();

    for quest in inputs.quests.iter().filter(|q| q.is_completed()) {
        // an id seen twice counts once
        if !snapshot.completed_quest_ids.insert(quest.quest_id.clone()) {
            continue;
        }

        match quest.quest_type.or_else(|| types.get(quest.quest_id.as_str()).copied()) {
            Some(QuestType::Location) => snapshot.location_completed += 1,
            Some(QuestType::Social) => snapshot.social_completed += 1,
            Some(QuestType::Scan) => snapshot.scan_completed += 1,
            None => {}
        }

        total_xp += quest.xp_awarded;
        if let Some(at) = quest.completed_at {
            completion_days.insert(at.date_naive());
        }
    }

    snapshot.total_completed = snapshot.completed_quest_ids.len() as u32;
    snapshot.total_xp = u32::try_from(total_xp.non_negative().as_i64()).unwrap_or(u32::MAX);

    let (current, longest) = streaks(&completion_days, today);
    snapshot.current_streak = current;
    snapshot.longest_streak = longest;

    snapshot
}

/// (current, longest) runs of consecutive days.
///
/// The current run must end today or yesterday; a streak is not broken until
/// a full day passes without a completion.
fn streaks(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let current = match prev {
        Some(last) if last == today || last.succ_opt() == Some(today) => run,
        _ => 0,
    };

    (current, longest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use questlog_core::{Difficulty, QuestReward, QuestStatus};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn completed(id: &str, on: u32, xp: i64, quest_type: Option<QuestType>) -> QuestInstance {
        QuestInstance {
            quest_id: id.to_string(),
            status: QuestStatus::Completed,
            progress: 1,
            target: 1,
            quest_type,
            started_at: None,
            completed_at: Some(Utc.with_ymd_and_hms(2026, 5, on, 18, 30, 0).unwrap()),
            xp_awarded: Xp(xp),
        }
    }

    fn definition(id: &str, quest_type: QuestType) -> QuestDefinition {
        QuestDefinition {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            reward: QuestReward::default(),
            quest_type,
            target: 1,
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn counts_by_type_with_definition_fallback() {
        let quests = vec![
            completed("q1", 1, 100, Some(QuestType::Scan)),
            completed("q2", 2, 50, None),
            completed("q2", 2, 50, None),
            QuestInstance {
                status: QuestStatus::Active,
                completed_at: None,
                ..completed("q3", 3, 0, Some(QuestType::Social))
            },
        ];
        let definitions = vec![definition("q2", QuestType::Location)];
        let social = SocialStats {
            friend_count: 4,
            unique_cards: 2,
        };

        let snapshot = compute_snapshot(
            StatsInputs {
                quests: &quests,
                definitions: &definitions,
                social: &social,
            },
            day(10),
        );

        assert_eq!(snapshot.total_completed, 2);
        assert_eq!(snapshot.scan_completed, 1);
        assert_eq!(snapshot.location_completed, 1);
        assert_eq!(snapshot.social_completed, 0);
        assert_eq!(snapshot.total_xp, 150);
        assert_eq!(snapshot.friend_count, 4);
        assert_eq!(snapshot.unique_cards, 2);
        assert!(snapshot.has_completed("q2"));
        assert!(!snapshot.has_completed("q3"));
    }

    #[test]
    fn streak_survives_until_a_full_day_is_missed() {
        let days: BTreeSet<NaiveDate> = [day(1), day(2), day(3), day(6), day(7)]
            .into_iter()
            .collect();

        assert_eq!(streaks(&days, day(7)), (2, 3));
        assert_eq!(streaks(&days, day(8)), (2, 3));
        assert_eq!(streaks(&days, day(9)), (0, 3));
        assert_eq!(streaks(&BTreeSet::new(), day(9)), (0, 0));
    }

    #[test]
    fn negative_xp_clamps_to_zero() {
        let quests = vec![completed("q1", 1, -40, None)];
        let social = SocialStats::default();
        let snapshot = compute_snapshot(
            StatsInputs {
                quests: &quests,
                definitions: &[],
                social: &social,
            },
            day(1),
        );
        assert_eq!(snapshot.total_xp, 0);
        assert_eq!(snapshot.current_streak, 1);
    }
}
