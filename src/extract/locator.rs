//! Ordered selector fallback chains
//!
//! Every field is read through a [`LocatorChain`]: an ordered list of
//! [`Locator`]s evaluated by one resolver. The first candidate that yields an
//! acceptable value wins; later candidates are never queried. Lookup errors
//! and missing nodes both mean "absent", never a failure of the caller.

use crate::browser::{PageNode, SearchRoot};
use crate::extract::text::contains_digit;
use serde::Deserialize;
use tracing::{debug, trace};

/// One locator candidate: a CSS selector plus what to read from the match
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Locator {
    pub css: String,

    /// Attribute to read; the rendered text is read when unset
    #[serde(default)]
    pub attribute: Option<String>,
}

impl Locator {
    /// A locator reading the matched node's text
    pub fn text(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            attribute: None,
        }
    }

    /// A locator reading the attribute `name` of the matched node
    pub fn attribute(css: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            attribute: Some(name.into()),
        }
    }

    async fn read(&self, node: &dyn PageNode) -> Option<String> {
        let result = match &self.attribute {
            Some(name) => node.attribute(name).await,
            None => node.text().await,
        };
        match result {
            Ok(value) => value,
            Err(e) => {
                debug!(selector = %self.css, "Read failed: {}", e);
                None
            }
        }
    }
}

/// Rule a trimmed, non-empty value must pass to be accepted
#[derive(Debug, Clone, Copy)]
pub enum Acceptance<'a> {
    NonEmpty,
    /// Counters: at least one digit
    ContainsDigit,
    /// Must contain the given substring (item links)
    Contains(&'a str),
    /// Must contain one of the given substrings (media hosts)
    ContainsAny(&'a [String]),
}

impl Acceptance<'_> {
    pub fn accepts(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Self::NonEmpty => true,
            Self::ContainsDigit => contains_digit(value),
            Self::Contains(marker) => value.contains(*marker),
            Self::ContainsAny(needles) => needles.iter().any(|needle| value.contains(needle.as_str())),
        }
    }
}

/// Outcome of one extraction: the value and whether any candidate produced it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub value: String,
    pub present: bool,
}

impl Extraction {
    pub fn found(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            present: true,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    /// The value when present, `None` otherwise
    pub fn into_option(self) -> Option<String> {
        self.present.then_some(self.value)
    }
}

/// An ordered candidate list for one semantic field
#[derive(Debug, Clone, Copy)]
pub struct LocatorChain<'a> {
    field: &'static str,
    locators: &'a [Locator],
    acceptance: Acceptance<'a>,
}

impl<'a> LocatorChain<'a> {
    pub fn new(field: &'static str, locators: &'a [Locator], acceptance: Acceptance<'a>) -> Self {
        Self {
            field,
            locators,
            acceptance,
        }
    }

    /// Evaluates the candidates in order against `root`
    ///
    /// For each candidate the first matching node is read; the trimmed value
    /// is returned as soon as it passes the chain's [`Acceptance`] rule.
    pub async fn resolve<R>(&self, root: &R) -> Extraction
    where
        R: SearchRoot + ?Sized,
    {
        for (position, locator) in self.locators.iter().enumerate() {
            let node = match root.find(&locator.css).await {
                Ok(Some(node)) => node,
                Ok(None) => continue,
                Err(e) => {
                    debug!(field = self.field, selector = %locator.css, "Lookup failed: {}", e);
                    continue;
                }
            };

            let Some(raw) = locator.read(node.as_ref()).await else {
                continue;
            };

            let value = raw.trim();
            if self.acceptance.accepts(value) {
                trace!(field = self.field, candidate = position, "Locator matched");
                return Extraction::found(value);
            }
        }

        Extraction::absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Root whose matches are fixed per selector and which records every lookup
    #[derive(Default)]
    struct RecordingRoot {
        matches: HashMap<String, String>,
        queried: Mutex<Vec<String>>,
    }

    impl RecordingRoot {
        fn with(mut self, selector: &str, text: &str) -> Self {
            self.matches.insert(selector.to_string(), text.to_string());
            self
        }

        fn queried(&self) -> Vec<String> {
            self.queried.lock().unwrap().clone()
        }
    }

    struct FixedNode {
        text: String,
    }

    #[async_trait]
    impl SearchRoot for FixedNode {
        async fn find(&self, _selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl PageNode for FixedNode {
        async fn text(&self) -> BrowserResult<Option<String>> {
            Ok(Some(self.text.clone()))
        }

        async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
            Ok(Some(format!("{}:{}", name, self.text)))
        }

        async fn parent(&self) -> BrowserResult<Option<Box<dyn PageNode>>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl SearchRoot for RecordingRoot {
        async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
            self.queried.lock().unwrap().push(selector.to_string());
            Ok(self.matches.get(selector).map(|text| {
                Box::new(FixedNode { text: text.clone() }) as Box<dyn PageNode>
            }))
        }
    }

    fn candidates() -> Vec<Locator> {
        vec![
            Locator::text(".a"),
            Locator::text(".b"),
            Locator::text(".c"),
            Locator::text(".d"),
        ]
    }

    #[tokio::test]
    async fn test_first_acceptable_candidate_wins() {
        let root = RecordingRoot::default().with(".c", " 1.2K ").with(".d", "999");
        let locators = candidates();
        let chain = LocatorChain::new("views", &locators, Acceptance::ContainsDigit);

        let extraction = chain.resolve(&root).await;

        assert_eq!(extraction, Extraction::found("1.2K"));
        // Earlier candidates were queried and found absent, later ones never touched
        assert_eq!(root.queried(), vec![".a", ".b", ".c"]);
    }

    #[tokio::test]
    async fn test_unacceptable_value_falls_through() {
        let root = RecordingRoot::default().with(".a", "no digits").with(".b", "42");
        let locators = candidates();
        let chain = LocatorChain::new("views", &locators, Acceptance::ContainsDigit);

        assert_eq!(chain.resolve(&root).await.value, "42");
    }

    #[tokio::test]
    async fn test_no_match_is_absent() {
        let root = RecordingRoot::default().with(".a", "   ");
        let locators = candidates();
        let chain = LocatorChain::new("description", &locators, Acceptance::NonEmpty);

        let extraction = chain.resolve(&root).await;
        assert!(!extraction.present);
        assert_eq!(extraction.value, "");
        assert_eq!(root.queried().len(), 4);
    }

    #[tokio::test]
    async fn test_attribute_locator() {
        let root = RecordingRoot::default().with("a", "/video/1");
        let locators = vec![Locator::attribute("a", "href")];
        let chain = LocatorChain::new("video_link", &locators, Acceptance::Contains("/video/"));

        assert_eq!(chain.resolve(&root).await.value, "href:/video/1");
    }

    #[test]
    fn test_acceptance_rules() {
        let hosts = vec!["cdn.example".to_string()];
        assert!(Acceptance::ContainsAny(&hosts).accepts("https://cdn.example/img.jpg"));
        assert!(!Acceptance::ContainsAny(&hosts).accepts("data:image/gif;base64,"));
        assert!(!Acceptance::NonEmpty.accepts(""));
        assert!(!Acceptance::ContainsDigit.accepts("K"));
    }

    #[test]
    fn test_locator_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            list: Vec<Locator>,
        }
        let wrapper: Wrapper =
            toml::from_str(r#"list = [{ css = "a" }, { css = "img", attribute = "src" }]"#).unwrap();
        assert_eq!(wrapper.list[0], Locator::text("a"));
        assert_eq!(wrapper.list[1], Locator::attribute("img", "src"));
    }
}
