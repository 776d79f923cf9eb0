//! High-level API wrappers
//!
//! Validation that must happen before anything touches the network, plus
//! logging of the user-facing actions. Generic over any `QuestBackend`.

mod challenges;
mod quests;

pub use challenges::*;
pub use quests::*;
