use std::collections::HashSet;

/// Tracks which item URLs have been committed
///
/// A URL is committed only after its record was fully extracted and handed
/// to the sink, so an interrupted item is never marked as seen.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    committed: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the set with URLs committed by a previous run
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            committed: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_committed(&self, url: &str) -> bool {
        self.committed.contains(url)
    }

    /// Marks `url` committed; returns false if it already was
    pub fn commit(&mut self, url: &str) -> bool {
        if self.committed.contains(url) {
            return false;
        }
        self.committed.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_url_committed_once() {
        let mut dedup = Deduplicator::new();
        let url = "https://www.tiktok.com/@a/video/1";

        assert!(!dedup.is_committed(url));
        assert!(dedup.commit(url));
        assert!(dedup.is_committed(url));
        assert!(!dedup.commit(url));
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_seeded_from_previous_run() {
        let dedup = Deduplicator::from_urls(vec!["https://x/video/1", "https://x/video/2"]);
        assert_eq!(dedup.len(), 2);
        assert!(dedup.is_committed("https://x/video/2"));
        assert!(!dedup.is_committed("https://x/video/3"));
    }

    #[test]
    fn test_empty() {
        assert!(Deduplicator::new().is_empty());
    }
}
