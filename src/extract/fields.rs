//! Field extractors for the grid and the detail view
//!
//! Each extractor is a [`LocatorChain`] with a field-specific acceptance rule
//! plus the normalization of its value. Absent values become empty strings
//! or zero; only a missing item URL makes the whole item unusable.

use crate::browser::{BrowserPage, PageNode, SearchRoot};
use crate::config::Config;
use crate::extract::locator::{Acceptance, Locator, LocatorChain};
use crate::extract::numeric::parse_count;
use crate::extract::text::collapse_whitespace;
use crate::record::{DetailFields, ListingFields};
use crate::url::{derive_id, resolve_item_url};
use chrono::Utc;
use tracing::debug;

/// Returns the item handles of the first selector that matches anything
///
/// An empty vector means none of the item selectors matched.
pub async fn enumerate_items(page: &dyn BrowserPage, locators: &[Locator]) -> Vec<Box<dyn PageNode>> {
    for locator in locators {
        match page.find_all(&locator.css).await {
            Ok(items) if !items.is_empty() => {
                debug!(selector = %locator.css, count = items.len(), "Items found");
                return items;
            }
            Ok(_) => {}
            Err(e) => debug!(selector = %locator.css, "Item lookup failed: {}", e),
        }
    }
    Vec::new()
}

/// Reads the canonical item URL from a grid item
///
/// The link must contain the item path marker; relative and
/// protocol-relative links are made absolute against the base URL.
pub async fn extract_video_url<R>(item: &R, config: &Config) -> Option<String>
where
    R: SearchRoot + ?Sized,
{
    let marker = config.target.item_path_marker.as_str();
    let href = LocatorChain::new(
        "video_link",
        &config.selectors.video_link,
        Acceptance::Contains(marker),
    )
    .resolve(item)
    .await
    .into_option()?;

    match resolve_item_url(&config.target.base_url, &href, marker) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(href = %href, "Unusable item link: {}", e);
            None
        }
    }
}

/// Reads the thumbnail URL; only recognized media hosts are accepted
pub async fn extract_thumbnail<R>(item: &R, config: &Config) -> String
where
    R: SearchRoot + ?Sized,
{
    LocatorChain::new(
        "thumbnail",
        &config.selectors.thumbnail,
        Acceptance::ContainsAny(&config.target.thumbnail_hosts),
    )
    .resolve(item)
    .await
    .value
}

/// Reads an abbreviated counter; zero when absent or unparseable
pub async fn extract_count<R>(root: &R, field: &'static str, locators: &[Locator]) -> u64
where
    R: SearchRoot + ?Sized,
{
    let extraction = LocatorChain::new(field, locators, Acceptance::ContainsDigit)
        .resolve(root)
        .await;
    parse_count(&extraction.value)
}

/// Reads the view counter of a grid item
///
/// Some layouts render the counter beside the item container rather than
/// inside it, so the enclosing element is searched when the item has none.
pub async fn extract_views<R>(item: &R, config: &Config) -> u64
where
    R: PageNode + ?Sized,
{
    let chain = LocatorChain::new("views", &config.selectors.views, Acceptance::ContainsDigit);
    let extraction = chain.resolve(item).await;
    if extraction.present {
        return parse_count(&extraction.value);
    }

    match item.parent().await {
        Ok(Some(parent)) => parse_count(&chain.resolve(parent.as_ref()).await.value),
        Ok(None) => 0,
        Err(e) => {
            debug!("Parent lookup for views failed: {}", e);
            0
        }
    }
}

/// Reads free text with whitespace collapsed
pub async fn extract_description<R>(root: &R, locators: &[Locator]) -> String
where
    R: SearchRoot + ?Sized,
{
    let extraction = LocatorChain::new("description", locators, Acceptance::NonEmpty)
        .resolve(root)
        .await;
    collapse_whitespace(&extraction.value)
}

/// Extracts the grid fields of one item
///
/// Returns `None` when the item has no usable URL; such items are dropped.
pub async fn extract_listing<R>(item: &R, config: &Config) -> Option<ListingFields>
where
    R: PageNode + ?Sized,
{
    let url = extract_video_url(item, config).await?;
    let id = derive_id(&url, &config.target.item_path_marker);
    let thumbnail_url = extract_thumbnail(item, config).await;
    let view_count = extract_views(item, config).await;

    Some(ListingFields {
        id,
        url,
        thumbnail_url,
        view_count,
        scraped_at: Utc::now(),
    })
}

/// Extracts the fields of the detail view currently displayed
pub async fn extract_detail<R>(page: &R, config: &Config) -> DetailFields
where
    R: SearchRoot + ?Sized,
{
    DetailFields {
        description: extract_description(page, &config.selectors.description).await,
        like_count: extract_count(page, "likes", &config.selectors.likes).await,
        comment_count: extract_count(page, "comments", &config.selectors.comments).await,
    }
}
