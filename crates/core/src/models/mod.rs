//! Data models for quest log entities

mod challenge;
mod leaderboard;
mod quest;
mod reward;
mod stats;
mod user;

pub use challenge::*;
pub use leaderboard::*;
pub use quest::*;
pub use reward::*;
pub use stats::*;
pub use user::*;
