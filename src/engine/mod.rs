pub mod selector;
pub mod targets;

pub use selector::select_primaries;
pub use targets::{compute_targets, Targets};
