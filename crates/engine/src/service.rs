//! Quest log service
//!
//! Owns the current [`QuestLogState`] and is the only writer to it. Every
//! mutation is checked against the local snapshot, confirmed where needed,
//! sent, and then followed by a full re-fetch. The post-mutation view always
//! comes from the backend, never from a local prediction.

use crate::confirm::Confirm;
use crate::reconcile::transitions;
use crate::store::{reduce, IngestBatch, QuestLogAction, QuestLogState};
use chrono::Utc;
use questlog_core::{
    rank_of, AdminOverride, Error, LeaderboardEntry, MutationReceipt, Result, ScanResult,
};
use questlog_networking::{api, QuestBackend};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Result of an action that asks for confirmation first
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<T> {
    Applied(T),
    /// The user said no. Nothing was sent.
    Declined,
}

impl<T> ActionOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            ActionOutcome::Applied(value) => Some(value),
            ActionOutcome::Declined => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeaderboardView {
    /// Highest XP first
    pub entries: Vec<LeaderboardEntry>,
    /// 1-based rank of the signed-in player, if listed
    pub my_rank: Option<usize>,
}

pub struct QuestLogService<B: QuestBackend + ?Sized> {
    backend: Arc<B>,
    confirm: Arc<dyn Confirm>,
    state: RwLock<Arc<QuestLogState>>,
    /// Number of fetches started so far
    fetch_seq: AtomicU64,
    /// Claims an admin removed, with the fetch count at that moment. Only a
    /// fetch started afterwards may drop them from the sticky set.
    revocations: Mutex<Vec<(String, u64)>>,
    /// Cancelled when the view goes away; in-flight results are then dropped
    cancel: CancellationToken,
}

impl<B: QuestBackend + ?Sized> QuestLogService<B> {
    pub fn new(backend: Arc<B>, confirm: Arc<dyn Confirm>) -> Self {
        Self::with_cancellation(backend, confirm, CancellationToken::new())
    }

    pub fn with_cancellation(
        backend: Arc<B>,
        confirm: Arc<dyn Confirm>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            confirm,
            state: RwLock::new(Arc::new(QuestLogState::default())),
            fetch_seq: AtomicU64::new(0),
            revocations: Mutex::new(Vec::new()),
            cancel,
        }
    }

    pub async fn snapshot(&self) -> Arc<QuestLogState> {
        self.state.read().await.clone()
    }

    /// Stop applying results. Requests already sent still complete remotely.
    pub fn detach(&self) {
        self.cancel.cancel();
        info!("Quest log view detached");
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Detached);
        }
        Ok(())
    }

    async fn dispatch(&self, action: QuestLogAction) -> Result<Arc<QuestLogState>> {
        self.ensure_attached()?;
        let mut guard = self.state.write().await;
        let next = Arc::new(reduce(&guard, action));
        *guard = next.clone();
        Ok(next)
    }

    /// Apply a fetch unless a newer one already landed
    async fn ingest(&self, batch: IngestBatch) -> Result<Arc<QuestLogState>> {
        self.ensure_attached()?;
        let mut guard = self.state.write().await;
        if !guard.accepts(batch.generation) {
            debug!(
                generation = batch.generation,
                applied = guard.generation,
                "Discarding superseded fetch"
            );
            return Ok(guard.clone());
        }

        let mut revoked = BTreeSet::new();
        self.revocations.lock().await.retain(|(id, seen)| {
            if *seen < batch.generation {
                revoked.insert(id.clone());
                false
            } else {
                true
            }
        });

        let next = Arc::new(reduce(&guard, QuestLogAction::Ingested { batch, revoked }));
        *guard = next.clone();
        Ok(next)
    }

    async fn record_revocation(&self, challenge_id: &str) {
        let seen = self.fetch_seq.load(Ordering::SeqCst);
        self.revocations
            .lock()
            .await
            .push((challenge_id.to_string(), seen));
    }

    /// Full re-fetch of session, definitions, records, quests and social stats
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<QuestLogState>> {
        self.ensure_attached()?;
        let generation = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let backend = &*self.backend;
        let fetch = async {
            let profile = backend.fetch_session().await?;
            let (challenge_definitions, records, quest_definitions, quests, social) =
                tokio::try_join!(
                    backend.fetch_event_challenges(),
                    backend.fetch_user_event_challenges(),
                    backend.fetch_quest_definitions(),
                    backend.fetch_user_quests(&profile.id),
                    backend.fetch_social_stats(&profile.id),
                )?;
            Ok::<_, Error>(IngestBatch {
                profile,
                challenge_definitions,
                records,
                quest_definitions,
                quests,
                social,
                fetched_at: Utc::now(),
                generation,
            })
        };

        let batch = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Refresh abandoned, view detached");
                return Err(Error::Detached);
            }
            batch = fetch => batch,
        };

        let batch = match batch {
            Ok(batch) => batch,
            Err(Error::TokenExpired) => {
                warn!("Session expired, clearing the quest log");
                self.dispatch(QuestLogAction::Cleared).await?;
                return Err(Error::TokenExpired);
            }
            Err(e) => return Err(e),
        };

        let state = self.ingest(batch).await?;
        info!(
            revision = state.revision,
            claimable = state.claimable_count(),
            "Quest log refreshed"
        );
        Ok(state)
    }

    /// Re-fetch after a mutation that already succeeded remotely. A failure
    /// here leaves the view stale until the next refresh.
    async fn refresh_after_mutation(&self) {
        match self.refresh().await {
            Ok(_) => {}
            Err(Error::Detached) => debug!("Skipping post-mutation refresh, view detached"),
            Err(e) => warn!("Refresh after mutation failed: {}", e),
        }
    }

    async fn ask(&self, message: &str) -> bool {
        let answer = self.confirm.confirm(message).await;
        if !answer {
            info!("Declined: {}", message);
        }
        answer
    }

    #[instrument(skip(self))]
    pub async fn start_challenge(&self, challenge_id: &str) -> Result<()> {
        self.ensure_attached()?;
        let state = self.snapshot().await;
        let view = state
            .challenge(challenge_id)
            .ok_or_else(|| Error::NotFound(format!("challenge {}", challenge_id)))?;
        transitions::start_challenge(challenge_id, view.status)?;

        api::start_challenge(&*self.backend, challenge_id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn claim_challenge(
        &self,
        challenge_id: &str,
    ) -> Result<ActionOutcome<MutationReceipt>> {
        self.ensure_attached()?;
        let state = self.snapshot().await;
        let view = state
            .challenge(challenge_id)
            .ok_or_else(|| Error::NotFound(format!("challenge {}", challenge_id)))?;
        transitions::claim_challenge(view)?;

        let message = format!(
            "Claim {} for \"{}\"?",
            view.definition.reward.xp, view.definition.title
        );
        if !self.ask(&message).await {
            return Ok(ActionOutcome::Declined);
        }
        self.ensure_attached()?;

        let receipt = api::claim_challenge(&*self.backend, view).await?;
        info!("Claimed {} ({})", challenge_id, receipt.xp_awarded);

        self.refresh_after_mutation().await;
        Ok(ActionOutcome::Applied(receipt))
    }

    /// Admin override on one of the signed-in player's challenges
    #[instrument(skip(self))]
    pub async fn admin_override_challenge(
        &self,
        challenge_id: &str,
        action: AdminOverride,
    ) -> Result<ActionOutcome<MutationReceipt>> {
        self.ensure_attached()?;
        let state = self.snapshot().await;
        let caller = state.caller()?;
        transitions::authorize_admin(&caller, action)?;

        let view = state
            .challenge(challenge_id)
            .ok_or_else(|| Error::NotFound(format!("challenge {}", challenge_id)))?;
        transitions::admin_challenge(view.status, action)?;

        let message = format!("Admin: {} challenge \"{}\"?", action, view.definition.title);
        if !self.ask(&message).await {
            return Ok(ActionOutcome::Declined);
        }
        self.ensure_attached()?;

        let receipt =
            api::override_challenge(&*self.backend, &caller.user_id, challenge_id, action).await?;

        if matches!(action, AdminOverride::Uncomplete | AdminOverride::Reset) {
            self.record_revocation(challenge_id).await;
        }
        self.refresh_after_mutation().await;
        Ok(ActionOutcome::Applied(receipt))
    }

    #[instrument(skip(self))]
    pub async fn start_quest(&self, quest_id: &str) -> Result<()> {
        self.ensure_attached()?;
        let status = self.snapshot().await.quest_status(quest_id)?;
        transitions::start_quest(quest_id, status)?;

        api::start_quest(&*self.backend, quest_id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    #[instrument(skip(self, code))]
    pub async fn redeem_scan_code(&self, code: &str) -> Result<ScanResult> {
        self.ensure_attached()?;
        let result = api::redeem_scan_code(&*self.backend, code).await?;
        if let Some(err) = result.error.as_ref().filter(|e| !e.is_empty()) {
            return Err(Error::RemoteFailure(err.clone()));
        }

        info!(
            quest = %result.quest_id,
            progress = result.progress,
            completed = result.completed,
            "Scan code redeemed"
        );
        self.refresh_after_mutation().await;
        Ok(result)
    }

    /// Admin override on one of the signed-in player's quests.
    ///
    /// The status sent along with a reset is the one in the local snapshot.
    #[instrument(skip(self))]
    pub async fn admin_override_quest(
        &self,
        quest_id: &str,
        action: AdminOverride,
    ) -> Result<ActionOutcome<MutationReceipt>> {
        self.ensure_attached()?;
        let state = self.snapshot().await;
        let caller = state.caller()?;
        transitions::authorize_admin(&caller, action)?;

        let current = state.quest_status(quest_id)?;
        transitions::admin_quest(current, action)?;

        let title = state
            .quest_definitions
            .iter()
            .find(|d| d.id == quest_id)
            .map_or(quest_id, |d| d.title.as_str());
        let message = format!("Admin: {} quest \"{}\"?", action, title);
        if !self.ask(&message).await {
            return Ok(ActionOutcome::Declined);
        }
        self.ensure_attached()?;

        let receipt =
            api::override_quest(&*self.backend, &caller.user_id, quest_id, action, current).await?;
        info!("Admin {} quest {}: {}", action, quest_id, receipt.xp_awarded);

        self.refresh_after_mutation().await;
        Ok(ActionOutcome::Applied(receipt))
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(&self, limit: u32) -> Result<LeaderboardView> {
        self.ensure_attached()?;
        let mut entries = self.backend.fetch_leaderboard(limit).await?;
        self.ensure_attached()?;

        entries.sort_by(|a, b| b.xp_u64().cmp(&a.xp_u64()));
        let my_rank = self
            .snapshot()
            .await
            .profile
            .as_ref()
            .and_then(|p| rank_of(&entries, &p.id));

        Ok(LeaderboardView { entries, my_rank })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use questlog_core::{
        ChallengeDefinition, ChallengeMode, ChallengeReward, ChallengeStatus, QuestDefinition,
        ProgressRule, QuestInstance, QuestReward, QuestStatus, QuestType, SocialStats, StatKey,
        UserChallengeRecord, UserProfile, Xp,
    };
    use questlog_networking::MockQuestBackend;
    use std::sync::Mutex;

    /// Backend-side truth the mock reads from and writes to
    #[derive(Default)]
    struct World {
        quests: Vec<QuestInstance>,
        records: Vec<UserChallengeRecord>,
        xp: i64,
        /// Reads of challenge records fail while set
        records_down: bool,
        session_expired: bool,
    }

    fn profile(is_admin: bool) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            username: "ana".to_string(),
            display_name: "Ana".to_string(),
            is_admin,
            xp: Xp::ZERO,
        }
    }

    fn challenge(id: &str, target: u32) -> ChallengeDefinition {
        ChallengeDefinition {
            id: id.to_string(),
            title: format!("Challenge {}", id),
            description: String::new(),
            rule: ProgressRule::Stat {
                stat: StatKey::TotalCompleted,
                target,
            },
            reward: ChallengeReward {
                xp: Xp(100),
                ..Default::default()
            },
            mode: ChallengeMode::Simple,
        }
    }

    fn quest_def(id: &str) -> QuestDefinition {
        QuestDefinition {
            id: id.to_string(),
            title: format!("Quest {}", id),
            description: String::new(),
            reward: QuestReward {
                xp: Xp(50),
                ..Default::default()
            },
            quest_type: QuestType::Scan,
            target: 1,
            difficulty: Default::default(),
        }
    }

    fn completed(id: &str) -> QuestInstance {
        QuestInstance {
            quest_id: id.to_string(),
            status: QuestStatus::Completed,
            progress: 1,
            target: 1,
            quest_type: None,
            started_at: None,
            completed_at: None,
            xp_awarded: Xp(50),
        }
    }

    fn world_with_one_completed() -> Arc<Mutex<World>> {
        Arc::new(Mutex::new(World {
            quests: vec![completed("q1")],
            xp: 50,
            ..Default::default()
        }))
    }

    /// Mock wired for every read except event challenge definitions
    fn reads(world: &Arc<Mutex<World>>, is_admin: bool) -> MockQuestBackend {
        let mut backend = MockQuestBackend::new();
        let w = world.clone();
        backend.expect_fetch_session().returning(move || {
            if w.lock().unwrap().session_expired {
                return Err(Error::TokenExpired);
            }
            Ok(profile(is_admin))
        });

        let w = world.clone();
        backend.expect_fetch_user_event_challenges().returning(move || {
            let world = w.lock().unwrap();
            if world.records_down {
                return Err(Error::RemoteFailure("records unavailable".into()));
            }
            Ok(world.records.clone())
        });
        backend
            .expect_fetch_quest_definitions()
            .returning(|| Ok(vec![quest_def("q1"), quest_def("q2")]));

        let w = world.clone();
        backend
            .expect_fetch_user_quests()
            .withf(|user_id| user_id == "u1")
            .returning(move |_| Ok(w.lock().unwrap().quests.clone()));
        backend
            .expect_fetch_social_stats()
            .returning(|_| Ok(SocialStats::default()));
        backend
    }

    fn full_backend(world: &Arc<Mutex<World>>, is_admin: bool) -> MockQuestBackend {
        let mut backend = reads(world, is_admin);
        backend
            .expect_fetch_event_challenges()
            .returning(|| Ok(vec![challenge("first", 1), challenge("five", 5)]));
        backend
    }

    fn service(
        backend: MockQuestBackend,
        confirm: AutoConfirm,
    ) -> QuestLogService<MockQuestBackend> {
        QuestLogService::new(Arc::new(backend), Arc::new(confirm))
    }

    #[tokio::test]
    async fn refresh_builds_grouped_view() {
        let world = world_with_one_completed();
        let svc = service(full_backend(&world, false), AutoConfirm::yes());

        let state = svc.refresh().await.unwrap();
        assert_eq!(state.revision, 1);
        assert_eq!(state.stats.total_completed, 1);
        assert_eq!(state.challenges[0].id(), "first");
        assert!(state.challenges[0].is_claimable());
        assert!(!state.challenges[1].is_completed);
    }

    #[tokio::test]
    async fn claim_when_not_completed_is_rejected_without_a_call() {
        let world = world_with_one_completed();
        let svc = service(full_backend(&world, false), AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let before = svc.snapshot().await;
        let result = svc.claim_challenge("five").await;

        assert!(matches!(result, Err(Error::NotClaimable(_))));
        assert_eq!(*svc.snapshot().await, *before);
    }

    #[tokio::test]
    async fn claim_applies_and_refetches() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);

        let w = world.clone();
        backend
            .expect_claim_event_challenge()
            .withf(|id, xp, ctx| id == "first" && *xp == Xp(100) && ctx.challenge_id == "first")
            .times(1)
            .returning(move |id, xp, _| {
                let mut world = w.lock().unwrap();
                world.records.push(UserChallengeRecord::new(id, ChallengeStatus::Claimed));
                world.xp += xp.as_i64();
                Ok(MutationReceipt {
                    xp_awarded: xp,
                    card: None,
                })
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let outcome = svc.claim_challenge("first").await.unwrap();
        assert_eq!(outcome.applied().unwrap().xp_awarded, Xp(100));

        let state = svc.snapshot().await;
        assert_eq!(state.revision, 2);
        assert!(state.challenge("first").unwrap().is_claimed);
        assert_eq!(state.challenges.last().unwrap().id(), "first");

        let again = svc.claim_challenge("first").await;
        assert!(matches!(again, Err(Error::NotClaimable(_))));
        assert_eq!(world.lock().unwrap().xp, 150);
    }

    #[tokio::test]
    async fn declined_claim_sends_nothing() {
        let world = world_with_one_completed();
        let svc = service(full_backend(&world, false), AutoConfirm::no());
        svc.refresh().await.unwrap();

        let outcome = svc.claim_challenge("first").await.unwrap();
        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(svc.snapshot().await.revision, 1);
    }

    #[tokio::test]
    async fn admin_reset_deducts_exactly_once() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, true);

        let w = world.clone();
        backend
            .expect_admin_reset_quest()
            .withf(|user_id, quest_id, status| {
                user_id == "u1" && quest_id == "q1" && *status == QuestStatus::Completed
            })
            .times(1)
            .returning(move |_, quest_id, _| {
                let mut world = w.lock().unwrap();
                world.quests.retain(|q| q.quest_id != quest_id);
                world.xp -= 50;
                Ok(MutationReceipt {
                    xp_awarded: Xp(-50),
                    card: None,
                })
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let outcome = svc
            .admin_override_quest("q1", AdminOverride::Reset)
            .await
            .unwrap();
        assert!(outcome.is_applied());

        let state = svc.snapshot().await;
        assert!(state.completed_quests().is_empty());
        assert_eq!(state.quest_status("q1").unwrap(), QuestStatus::Available);

        let second = svc.admin_override_quest("q1", AdminOverride::Reset).await;
        assert!(matches!(second, Err(Error::InvalidTransition { .. })));
        assert_eq!(world.lock().unwrap().xp, 0);
    }

    #[tokio::test]
    async fn admin_actions_need_admin_capability() {
        let world = world_with_one_completed();
        let svc = service(full_backend(&world, false), AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let challenge = svc
            .admin_override_challenge("first", AdminOverride::Complete)
            .await;
        assert!(matches!(challenge, Err(Error::Unauthorized(_))));

        let quest = svc.admin_override_quest("q1", AdminOverride::Reset).await;
        assert!(matches!(quest, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn admin_uncomplete_revokes_sticky_claim() {
        let world = world_with_one_completed();
        world
            .lock()
            .unwrap()
            .records
            .push(UserChallengeRecord::new("first", ChallengeStatus::Claimed));
        let mut backend = full_backend(&world, true);

        let w = world.clone();
        backend
            .expect_admin_uncomplete_challenge()
            .withf(|user_id, id| user_id == "u1" && id == "first")
            .times(1)
            .returning(move |_, id| {
                w.lock().unwrap().records.retain(|r| r.challenge_id != id);
                Ok(MutationReceipt {
                    xp_awarded: Xp(-100),
                    card: None,
                })
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();
        assert!(svc.snapshot().await.claimed.contains("first"));

        svc.admin_override_challenge("first", AdminOverride::Uncomplete)
            .await
            .unwrap();

        let state = svc.snapshot().await;
        assert!(!state.claimed.contains("first"));
        let view = state.challenge("first").unwrap();
        assert!(!view.is_claimed);
        // quest q1 is still done, so it is claimable again
        assert!(view.is_claimable());
    }

    #[tokio::test]
    async fn remote_failure_leaves_state_intact() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);
        backend
            .expect_start_challenge()
            .times(1)
            .returning(|_| Err(Error::RemoteFailure("server unavailable".into())));

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();
        let before = svc.snapshot().await;

        let result = svc.start_challenge("five").await;
        assert!(matches!(result, Err(Error::RemoteFailure(_))));
        assert_eq!(*svc.snapshot().await, *before);
    }

    #[tokio::test]
    async fn start_then_already_started() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);

        let w = world.clone();
        backend
            .expect_start_challenge()
            .withf(|id| id == "five")
            .times(1)
            .returning(move |id| {
                w.lock()
                    .unwrap()
                    .records
                    .push(UserChallengeRecord::new(id, ChallengeStatus::InProgress));
                Ok(())
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();
        svc.start_challenge("five").await.unwrap();

        let state = svc.snapshot().await;
        assert_eq!(state.challenge("five").unwrap().status, ChallengeStatus::InProgress);
        assert!(matches!(
            svc.start_challenge("five").await,
            Err(Error::AlreadyStarted(_))
        ));
    }

    #[tokio::test]
    async fn detach_mid_flight_discards_the_result() {
        let world = world_with_one_completed();
        let mut backend = reads(&world, false);
        let token = CancellationToken::new();

        let t = token.clone();
        backend.expect_fetch_event_challenges().returning(move || {
            // the view goes away while the fetch is in flight
            t.cancel();
            Ok(vec![challenge("first", 1)])
        });

        let svc = QuestLogService::with_cancellation(
            Arc::new(backend),
            Arc::new(AutoConfirm::yes()),
            token,
        );

        assert!(matches!(svc.refresh().await, Err(Error::Detached)));
        assert!(svc.is_detached());
        assert_eq!(svc.snapshot().await.revision, 0);
        assert!(matches!(svc.start_quest("q2").await, Err(Error::Detached)));
    }

    #[tokio::test]
    async fn scan_error_body_is_a_remote_failure() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);
        backend.expect_redeem_scan_code().times(1).returning(|_| {
            Ok(ScanResult {
                quest_id: String::new(),
                progress: 0,
                completed: false,
                xp_awarded: Xp::ZERO,
                error: Some("code already used".into()),
            })
        });

        let svc = service(backend, AutoConfirm::yes());
        let result = svc.redeem_scan_code(" USED-1 ").await;
        assert!(matches!(result, Err(Error::RemoteFailure(msg)) if msg == "code already used"));
    }

    #[tokio::test]
    async fn leaderboard_ranks_signed_in_player() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);
        backend
            .expect_fetch_leaderboard()
            .withf(|limit| *limit == 10)
            .returning(|_| {
                Ok(serde_json::from_value(serde_json::json!([
                    { "userId": 7, "username": "bo", "xp": 40 },
                    { "userId": "u1", "username": "ana", "xp": "90" }
                ]))
                .unwrap())
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let board = svc.leaderboard(10).await.unwrap();
        assert_eq!(board.entries[0].username, "ana");
        assert_eq!(board.my_rank, Some(1));
    }

    #[tokio::test]
    async fn claim_is_not_shown_until_a_fetch_confirms_it() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, false);

        let w = world.clone();
        backend
            .expect_claim_event_challenge()
            .times(1)
            .returning(move |id, xp, _| {
                let mut world = w.lock().unwrap();
                world.records.push(UserChallengeRecord::new(id, ChallengeStatus::Claimed));
                // the follow-up read fails
                world.records_down = true;
                Ok(MutationReceipt {
                    xp_awarded: xp,
                    card: None,
                })
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let outcome = svc.claim_challenge("first").await.unwrap();
        assert!(outcome.is_applied());

        let state = svc.snapshot().await;
        assert_eq!(state.revision, 1);
        assert!(state.claimed.is_empty());
        let view = state.challenge("first").unwrap();
        assert!(!view.is_claimed);
        assert_eq!(view.status, ChallengeStatus::NotStarted);

        world.lock().unwrap().records_down = false;
        let state = svc.refresh().await.unwrap();
        assert!(state.challenge("first").unwrap().is_claimed);
        assert!(state.claimed.contains("first"));
    }

    #[tokio::test]
    async fn admin_reset_of_active_quest_sends_active_status() {
        let world = world_with_one_completed();
        world.lock().unwrap().quests.push(QuestInstance {
            status: QuestStatus::Active,
            progress: 0,
            xp_awarded: Xp::ZERO,
            ..completed("q2")
        });
        let mut backend = full_backend(&world, true);

        let w = world.clone();
        backend
            .expect_admin_reset_quest()
            .withf(|user_id, quest_id, status| {
                user_id == "u1" && quest_id == "q2" && *status == QuestStatus::Active
            })
            .times(1)
            .returning(move |_, quest_id, _| {
                w.lock().unwrap().quests.retain(|q| q.quest_id != quest_id);
                Ok(MutationReceipt::default())
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        let outcome = svc
            .admin_override_quest("q2", AdminOverride::Reset)
            .await
            .unwrap();
        assert!(outcome.is_applied());

        let state = svc.snapshot().await;
        assert_eq!(state.quest_status("q2").unwrap(), QuestStatus::Available);
        assert_eq!(state.quest_status("q1").unwrap(), QuestStatus::Completed);
        assert_eq!(world.lock().unwrap().xp, 50);
    }

    #[tokio::test]
    async fn admin_complete_makes_challenge_claimable() {
        let world = world_with_one_completed();
        let mut backend = full_backend(&world, true);

        let w = world.clone();
        backend
            .expect_admin_complete_challenge()
            .withf(|user_id, id| user_id == "u1" && id == "five")
            .times(1)
            .returning(move |_, id| {
                w.lock()
                    .unwrap()
                    .records
                    .push(UserChallengeRecord::new(id, ChallengeStatus::Completed));
                Ok(MutationReceipt::default())
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();
        assert!(!svc.snapshot().await.challenge("five").unwrap().is_completed);

        svc.admin_override_challenge("five", AdminOverride::Complete)
            .await
            .unwrap();

        let state = svc.snapshot().await;
        let view = state.challenge("five").unwrap();
        assert_eq!(view.status, ChallengeStatus::Completed);
        assert!(view.is_claimable());
        assert_eq!(state.claimable_count(), 2);
    }

    #[tokio::test]
    async fn admin_reset_clears_sticky_claim_once_refetched() {
        let world = world_with_one_completed();
        world
            .lock()
            .unwrap()
            .records
            .push(UserChallengeRecord::new("first", ChallengeStatus::Claimed));
        let mut backend = full_backend(&world, true);

        let w = world.clone();
        backend
            .expect_admin_reset_challenge()
            .withf(|user_id, id| user_id == "u1" && id == "first")
            .times(1)
            .returning(move |_, id| {
                let mut world = w.lock().unwrap();
                world.records.retain(|r| r.challenge_id != id);
                world.records_down = true;
                Ok(MutationReceipt {
                    xp_awarded: Xp(-100),
                    card: None,
                })
            });

        let svc = service(backend, AutoConfirm::yes());
        svc.refresh().await.unwrap();

        svc.admin_override_challenge("first", AdminOverride::Reset)
            .await
            .unwrap();

        // the re-fetch failed, so the last confirmed view stays
        let state = svc.snapshot().await;
        assert!(state.challenge("first").unwrap().is_claimed);

        world.lock().unwrap().records_down = false;
        let state = svc.refresh().await.unwrap();
        assert!(!state.claimed.contains("first"));
        assert!(!state.challenge("first").unwrap().is_claimed);
    }

    #[tokio::test]
    async fn expired_session_clears_the_view() {
        let world = world_with_one_completed();
        let svc = service(full_backend(&world, false), AutoConfirm::yes());
        svc.refresh().await.unwrap();

        world.lock().unwrap().session_expired = true;
        assert!(matches!(svc.refresh().await, Err(Error::TokenExpired)));

        let state = svc.snapshot().await;
        assert!(state.profile.is_none());
        assert!(state.challenges.is_empty());
    }
}
