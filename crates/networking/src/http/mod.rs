//! HTTP implementation of the backend contract

mod client;

pub use client::{ClientConfig, DefinitionCache, QuestClient};
