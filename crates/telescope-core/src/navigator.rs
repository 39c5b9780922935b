use crate::config::SelectionPolicy;
use crate::types::{ResultSet, SearchResult};

/// Highlight cursor over a session's current result set.
///
/// Every operation is O(1) and total: moving over an empty set or
/// highlighting an out-of-range index leaves the state untouched.
#[derive(Debug, Clone)]
pub struct ResultSetNavigator {
    results: ResultSet,
    highlighted: Option<usize>,
    policy: SelectionPolicy,
}

impl ResultSetNavigator {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            results: ResultSet::empty(),
            highlighted: None,
            policy,
        }
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Replace the result set. The highlight resets to the first result or
    /// to nothing, following the selection policy.
    pub fn set_results(&mut self, results: ResultSet) {
        self.highlighted = match self.policy {
            SelectionPolicy::First if !results.is_empty() => Some(0),
            _ => None,
        };
        self.results = results;
    }

    /// Move the highlight by `delta`, wrapping at both ends. With nothing
    /// highlighted the cursor starts from just before the first result.
    pub fn move_by(&mut self, delta: i64) -> Option<usize> {
        let len = self.results.len();
        if len == 0 {
            return self.highlighted;
        }

        let len = len as i64;
        let from = self.highlighted.map_or(-1, |i| i as i64);
        let next = (from + delta.rem_euclid(len)).rem_euclid(len);
        self.highlighted = Some(next as usize);
        self.highlighted
    }

    /// Returns false, and changes nothing, for an out-of-range index
    pub fn set_highlighted(&mut self, index: usize) -> bool {
        if index >= self.results.len() {
            return false;
        }
        self.highlighted = Some(index);
        true
    }

    pub fn current(&self) -> Option<&SearchResult> {
        self.highlighted.and_then(|i| self.results.get(i))
    }
}
