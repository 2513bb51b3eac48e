use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameters the site appends to item links for attribution only
const TRACKING_PARAMS: &[&str] = &["is_from_webapp", "sender_device", "refer", "lang", "q"];

/// Builds the absolute profile URL for a handle
///
/// # Arguments
///
/// * `base_url` - Site origin (e.g. `https://www.tiktok.com`)
/// * `handle` - Profile handle, with or without the leading `@`
///
/// # Examples
///
/// ```
/// use reel_harvest::url::profile_url;
///
/// let url = profile_url("https://www.tiktok.com", "@creator").unwrap();
/// assert_eq!(url, "https://www.tiktok.com/@creator");
/// ```
pub fn profile_url(base_url: &str, handle: &str) -> UrlResult<String> {
    let base = parse_base(base_url)?;
    let handle = handle.trim().trim_start_matches('@');
    let url = base
        .join(&format!("/@{}", handle))
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    Ok(url.to_string())
}

/// Resolves an item link found in the feed into a canonical absolute URL
///
/// # Normalization Steps
///
/// 1. Join the raw `href` onto the base URL; this turns site-relative
///    (`/@x/video/1`) and protocol-relative (`//host/...`) links absolute
/// 2. Only HTTP and HTTPS are accepted
/// 3. The path must contain the item marker
/// 4. Remove the fragment
/// 5. Remove attribution query parameters and sort the rest
///
/// # Returns
///
/// * `Ok(String)` - The canonical item URL
/// * `Err(UrlError)` - The link cannot be resolved or is not an item link
///
/// # Examples
///
/// ```
/// use reel_harvest::url::resolve_item_url;
///
/// let url = resolve_item_url(
///     "https://www.tiktok.com",
///     "/@creator/video/7234567890123456789?is_from_webapp=1",
///     "/video/",
/// )
/// .unwrap();
/// assert_eq!(url, "https://www.tiktok.com/@creator/video/7234567890123456789");
/// ```
pub fn resolve_item_url(base_url: &str, href: &str, marker: &str) -> UrlResult<String> {
    let href = href.trim();
    if href.is_empty() {
        return Err(UrlError::Parse("empty link".to_string()));
    }

    // Step 1: Resolve against the base
    let base = parse_base(base_url)?;
    let mut url = base.join(href).map_err(|e| UrlError::Parse(e.to_string()))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Must be an item link
    if !url.path().contains(marker) {
        return Err(UrlError::MissingMarker {
            url: url.to_string(),
            marker: marker.to_string(),
        });
    }

    // Step 4: Remove fragment
    url.set_fragment(None);

    // Step 5: Filter and sort query parameters
    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            // Re-encode, the decoded values may contain `&` or `=`
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url.to_string())
}

fn parse_base(base_url: &str) -> UrlResult<Url> {
    Url::parse(base_url).map_err(|e| UrlError::Parse(format!("{}: {}", base_url, e)))
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
