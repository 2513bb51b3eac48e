//! URL handling module for Reel-Harvest
//!
//! This module builds profile URLs, resolves item links found in the feed
//! into canonical absolute URLs, and derives item identifiers from them.

mod identity;
mod normalize;

// Re-export main functions
pub use identity::derive_id;
pub use normalize::{profile_url, resolve_item_url};
