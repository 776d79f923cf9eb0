//! Plain-text rendering of the quest log

use questlog_core::{ChallengeView, Error, QuestStatus, ViewGroup};
use questlog_engine::{LeaderboardView, QuestLogState};
use std::fmt::Write;

fn group_title(group: ViewGroup) -> &'static str {
    match group {
        ViewGroup::Claimable => "Claim reward",
        ViewGroup::InProgress => "In progress",
        ViewGroup::Done => "Completed",
    }
}

fn challenge_line(view: &ChallengeView) -> String {
    let mark = if view.is_claimed {
        "[x]"
    } else if view.is_completed {
        "[!]"
    } else {
        "[ ]"
    };
    format!(
        "  {} {} ({}/{}) {} - {}",
        mark,
        view.definition.title,
        view.progress.current.min(view.progress.target),
        view.progress.target,
        view.definition.reward.xp,
        view.id()
    )
}

/// Challenges under their display groups. Empty groups are left out.
pub fn challenges(state: &QuestLogState) -> String {
    let mut out = String::new();
    for group in [ViewGroup::Claimable, ViewGroup::InProgress, ViewGroup::Done] {
        let mut views = state.challenges_in(group).peekable();
        if views.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "{}", group_title(group));
        for view in views {
            let _ = writeln!(out, "{}", challenge_line(view));
        }
    }
    if out.is_empty() {
        out.push_str("No challenges yet\n");
    }
    out
}

pub fn quests(state: &QuestLogState) -> String {
    let mut out = String::new();
    for definition in &state.quest_definitions {
        let (status, progress) = match state.quest(&definition.id) {
            Some(q) => (q.status, format!("{}/{}", q.progress, q.target)),
            None => (QuestStatus::Available, format!("0/{}", definition.target)),
        };
        let gems = match definition.reward.gems.as_u32() {
            0 => String::new(),
            n => format!(" +{} gems", n),
        };
        let _ = writeln!(
            out,
            "  {:<10} {} ({}) {}{} - {}",
            status.as_str(),
            definition.title,
            progress,
            definition.reward.xp,
            gems,
            definition.id
        );
    }
    out
}

pub fn summary(state: &QuestLogState) -> String {
    let name = state
        .profile
        .as_ref()
        .map_or("unknown player", |p| p.display_name.as_str());
    format!(
        "{}: {} quests done, streak {} (best {}), {} to claim",
        name,
        state.stats.total_completed,
        state.stats.current_streak,
        state.stats.longest_streak,
        state.claimable_count()
    )
}

pub fn leaderboard(view: &LeaderboardView) -> String {
    let mut out = String::new();
    for (i, entry) in view.entries.iter().enumerate() {
        let rank = i + 1;
        let me = if view.my_rank == Some(rank) { " <- you" } else { "" };
        let _ = writeln!(
            out,
            "{:>3}. {:<20} {:>7} XP {:>4} quests{}",
            rank,
            entry.username,
            entry.xp_u64(),
            entry.quests_completed_u64(),
            me
        );
    }
    if view.my_rank.is_none() {
        out.push_str("You are not on this page of the leaderboard\n");
    }
    out
}

/// Alert text for a failed command. Empty when there is nothing to tell.
pub fn failure(err: &Error) -> String {
    let message = err.user_message();
    if message.is_empty() || !err.is_retryable() {
        return message;
    }
    format!("{}\nRun the command again to retry.", message)
}
