//! Questlog Networking - Backend trait, HTTP client, and API wrappers

pub mod api;
pub mod backend;
pub mod http;

pub use backend::QuestBackend;
#[cfg(any(test, feature = "testing"))]
pub use backend::MockQuestBackend;
pub use http::{ClientConfig, DefinitionCache, QuestClient};
