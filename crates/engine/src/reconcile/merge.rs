//! Status Merger
//!
//! Folds computed progress and stored records into one view per definition.

use crate::progress::Evaluated;
use questlog_core::{ChallengeStatus, ChallengeView, UserChallengeRecord};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Index records by challenge id. On duplicate ids the first record wins.
pub fn index_records(records: &[UserChallengeRecord]) -> HashMap<&str, &UserChallengeRecord> {
    let mut index: HashMap<&str, &UserChallengeRecord> = HashMap::with_capacity(records.len());
    for record in records {
        if index.contains_key(record.challenge_id.as_str()) {
            warn!(
                "Duplicate record for challenge {}, keeping the first",
                record.challenge_id
            );
            continue;
        }
        index.insert(record.challenge_id.as_str(), record);
    }
    index
}

/// One merged view per evaluated definition, in source order.
///
/// `sticky_claims` are ids known to be claimed from an earlier ingestion.
/// They stay claimed even if the current records disagree.
pub fn merge(
    evaluated: &[Evaluated<'_>],
    records: &[UserChallengeRecord],
    sticky_claims: &BTreeSet<String>,
) -> Vec<ChallengeView> {
    let index = index_records(records);

    evaluated
        .iter()
        .map(|item| {
            let id = item.definition.id.as_str();
            let record = index.get(id).copied();

            let mut status = record.map(|r| r.status).unwrap_or_default();
            if sticky_claims.contains(id) {
                status = ChallengeStatus::Claimed;
            }

            let is_claimed = status == ChallengeStatus::Claimed;
            let is_completed = is_claimed
                || status == ChallengeStatus::Completed
                || item.progress.is_completed();

            ChallengeView {
                definition: item.definition.clone(),
                progress: item.progress,
                status,
                is_completed,
                is_claimed,
                completed_at: record.and_then(|r| r.completed_at),
                claimed_at: record.and_then(|r| r.claimed_at),
            }
        })
        .collect()
}

/// Claimable first, then in progress, then done. Stable within a group.
pub fn sort_for_display(views: &mut [ChallengeView]) {
    views.sort_by_key(|view| view.group());
}
