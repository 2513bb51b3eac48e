//! Field extraction
//!
//! - `numeric`: abbreviated counter parsing (`"1.2K"` to 1200)
//! - `text`: whitespace normalization
//! - `locator`: ordered selector fallback chains and their single resolver
//! - `fields`: the grid and detail-view extractors built on those chains

mod fields;
mod locator;
mod numeric;
mod text;

pub use fields::{
    enumerate_items, extract_count, extract_description, extract_detail, extract_listing,
    extract_thumbnail, extract_video_url, extract_views,
};
pub use locator::{Acceptance, Extraction, Locator, LocatorChain};
pub use numeric::parse_count;
pub use text::{collapse_whitespace, contains_digit};
