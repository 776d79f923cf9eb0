//! Status merging and the per-record state machine

pub mod merge;
pub mod transitions;

pub use merge::{index_records, merge, sort_for_display};
