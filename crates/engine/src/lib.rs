//! Questlog Engine - Progress evaluation, status merging, and reconciliation

pub mod confirm;
pub mod progress;
pub mod reconcile;
pub mod service;
pub mod store;

pub use confirm::{AutoConfirm, Confirm};
pub use service::{ActionOutcome, LeaderboardView, QuestLogService};
pub use store::{QuestLogAction, QuestLogState};
