//! Outcome definitions for the items of one crawl
//!
//! Every visited grid position ends in exactly one of these states.

use std::fmt;

/// Final state of one grid item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Success =====
    /// Record extracted, handed to the sink and its URL committed
    Committed,

    /// Detail view unreachable; committed with grid fields only
    Partial,

    // ===== Skips =====
    /// URL was already committed earlier in this or a previous run
    Duplicate,

    /// No usable item URL could be read; the item cannot be identified
    Dropped,

    // ===== Failures =====
    /// The sink rejected the record
    Failed,
}

impl ItemState {
    /// Returns true if a record was committed for the item
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Committed | Self::Partial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Partial => "partial",
            Self::Duplicate => "duplicate",
            Self::Dropped => "dropped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running tally of item outcomes
///
/// `committed` counts every record written, `partial` the subset of them
/// without detail fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemTally {
    pub committed: usize,
    pub partial: usize,
    pub duplicates: usize,
    pub dropped: usize,
    pub failed: usize,
}

impl ItemTally {
    pub fn record(&mut self, state: ItemState) {
        if state.is_success() {
            self.committed += 1;
        }
        match state {
            ItemState::Committed => {}
            ItemState::Partial => self.partial += 1,
            ItemState::Duplicate => self.duplicates += 1,
            ItemState::Dropped => self.dropped += 1,
            ItemState::Failed => self.failed += 1,
        }
    }

    /// Number of items visited, whatever their outcome
    pub fn visited(&self) -> usize {
        self.committed + self.duplicates + self.dropped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ItemState::Committed.is_success());
        assert!(ItemState::Partial.is_success());
        assert!(!ItemState::Duplicate.is_success());
        assert!(!ItemState::Dropped.is_success());
        assert!(!ItemState::Failed.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(ItemState::Duplicate.to_string(), "duplicate");
        assert_eq!(format!("{}", ItemState::Partial), "partial");
    }

    #[test]
    fn test_tally() {
        let mut tally = ItemTally::default();
        for state in [
            ItemState::Committed,
            ItemState::Partial,
            ItemState::Duplicate,
            ItemState::Dropped,
            ItemState::Failed,
        ] {
            tally.record(state);
        }

        assert_eq!(tally.committed, 2);
        assert_eq!(tally.partial, 1);
        assert_eq!(tally.duplicates, 1);
        assert_eq!(tally.visited(), 5);
    }
}
