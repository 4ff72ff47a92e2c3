//! Table transformations: explode-by-delimiter and group-by-column,
//! plus the high-level orchestration pipeline.

pub mod explode;
pub mod group;
pub mod pipeline;

pub use explode::explode;
pub use group::{group_by, Group, Grouping, EMPTY_GROUP_KEY};
