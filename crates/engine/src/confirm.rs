//! Confirmation capability
//!
//! Claims and admin overrides ask before doing anything remote. Each platform
//! supplies its own dialog behind this trait.

use async_trait::async_trait;

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Ask the user; `true` means go ahead
    async fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer, for headless runs and `--yes`
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm {
    answer: bool,
}

impl AutoConfirm {
    pub fn yes() -> Self {
        Self { answer: true }
    }

    pub fn no() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        tracing::debug!(answer = self.answer, "Auto-answering: {}", message);
        self.answer
    }
}
