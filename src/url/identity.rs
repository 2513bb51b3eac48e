/// Derives an item identifier from its URL
///
/// Query string and fragment are ignored. The identifier is the path
/// segment directly after the first occurrence of `marker`. When the marker
/// is missing, the first all-digit path segment longer than ten characters
/// is used. An empty string means no identifier could be derived.
///
/// # Examples
///
/// ```
/// use reel_harvest::url::derive_id;
///
/// let id = derive_id("https://www.tiktok.com/@a/video/7234567890?lang=fr", "/video/");
/// assert_eq!(id, "7234567890");
/// assert_eq!(derive_id("https://www.tiktok.com/@a", "/video/"), "");
/// ```
pub fn derive_id(url: &str, marker: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or("");

    if !marker.is_empty() {
        if let Some(pos) = path.find(marker) {
            let tail = &path[pos + marker.len()..];
            let end = tail.find('/').unwrap_or(tail.len());
            if end > 0 {
                return tail[..end].to_string();
            }
        }
    }

    path.split('/')
        .find(|segment| segment.len() > 10 && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .unwrap_or_default()
}
