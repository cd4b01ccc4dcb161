use serde::{Deserialize, Serialize};

/// Boundary of the next page request.
///
/// `since` only moves forward: [`advance_past`](Self::advance_past) and
/// [`skip_window`](Self::skip_window) never decrease it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    since: i64,
    until: Option<i64>,
}

impl Cursor {
    /// Start a cursor at `since` with no upper bound.
    #[must_use]
    pub const fn new(since: i64) -> Self {
        Self { since, until: None }
    }

    /// Inclusive lower bound of the next request.
    #[must_use]
    pub const fn since(&self) -> i64 {
        self.since
    }

    /// Inclusive upper bound of the next request, if any.
    #[must_use]
    pub const fn until(&self) -> Option<i64> {
        self.until
    }

    /// Set the inclusive upper bound of the next request.
    pub const fn bound(&mut self, until: Option<i64>) {
        self.until = until;
    }

    /// Move to one tick after the last persisted timestamp.
    pub fn advance_past(&mut self, last: i64) {
        self.since = self.since.max(last.saturating_add(1));
    }

    /// Jump a whole window ahead without persisting anything.
    pub const fn skip_window(&mut self, window: i64) {
        self.since = self.since.saturating_add(window);
    }

    /// True once the cursor lies strictly beyond `end`.
    #[must_use]
    pub const fn is_past(&self, end: i64) -> bool {
        self.since > end
    }
}
