//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `Deduplicator`: the set of item URLs already committed
//! - `ItemState`: the final outcome of each visited grid item
//! - `ItemTally`: running counts of those outcomes

mod dedup;
mod item_state;

// Re-export main types
pub use dedup::Deduplicator;
pub use item_state::{ItemState, ItemTally};
