//! Plan ingestion for pyfix.
//!
//! Loading is all-or-nothing: a plan either validates completely and comes
//! back immutable, or the whole document is rejected. Nothing here touches
//! the filesystem; callers hand in bytes.

mod load;

pub use load::{PlanError, parse_plan};
