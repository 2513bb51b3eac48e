//! Harvested item records
//!
//! A record is assembled from two immutable halves: [`ListingFields`] read
//! from the profile grid and [`DetailFields`] read from the item's own page.
//! [`VideoRecord::merge`] combines them into a new value; nothing is updated
//! in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields available in the profile grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFields {
    /// Identifier derived from `url`; empty when it cannot be derived
    pub id: String,

    /// Canonical absolute item URL
    pub url: String,

    pub thumbnail_url: String,
    pub view_count: u64,

    /// Time the item was read from the grid
    pub scraped_at: DateTime<Utc>,
}

/// Fields only reliably present on the item's own page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub description: String,
    pub like_count: u64,
    pub comment_count: u64,
}

/// One harvested item
///
/// Serialized with the stable column order
/// `id, url, description, thumbnailUrl, viewCount, likeCount, commentCount,
/// scrapedAt, accountUsername`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub url: String,
    pub description: String,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub scraped_at: DateTime<Utc>,
    pub account_username: String,
}

/// Column names in output order
pub const COLUMNS: [&str; 9] = [
    "id",
    "url",
    "description",
    "thumbnailUrl",
    "viewCount",
    "likeCount",
    "commentCount",
    "scrapedAt",
    "accountUsername",
];

impl VideoRecord {
    /// Combines grid and detail fields into a complete record
    pub fn merge(listing: ListingFields, detail: DetailFields, username: &str) -> Self {
        Self {
            id: listing.id,
            url: listing.url,
            description: detail.description,
            thumbnail_url: listing.thumbnail_url,
            view_count: listing.view_count,
            like_count: detail.like_count,
            comment_count: detail.comment_count,
            scraped_at: listing.scraped_at,
            account_username: username.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_listing() -> ListingFields {
        ListingFields {
            id: "42".to_string(),
            url: "https://www.tiktok.com/@creator/video/42".to_string(),
            thumbnail_url: "https://p16.tiktokcdn.com/42.jpg".to_string(),
            view_count: 1_200,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_keeps_both_halves() {
        let listing = create_test_listing();
        let scraped_at = listing.scraped_at;
        let detail = DetailFields {
            description: "hello".to_string(),
            like_count: 10,
            comment_count: 2,
        };

        let record = VideoRecord::merge(listing, detail, "creator");

        assert_eq!(record.id, "42");
        assert_eq!(record.view_count, 1_200);
        assert_eq!(record.like_count, 10);
        assert_eq!(record.comment_count, 2);
        assert_eq!(record.description, "hello");
        assert_eq!(record.scraped_at, scraped_at);
        assert_eq!(record.account_username, "creator");
    }

    #[test]
    fn test_missing_detail_defaults_to_zero() {
        let record = VideoRecord::merge(create_test_listing(), DetailFields::default(), "creator");
        assert_eq!(record.description, "");
        assert_eq!(record.like_count, 0);
        assert_eq!(record.comment_count, 0);
    }

    #[test]
    fn test_csv_header_order() {
        let record = VideoRecord::merge(create_test_listing(), DetailFields::default(), "creator");
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&record).unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let header = output.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
    }
}
