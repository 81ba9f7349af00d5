//! Foreground window change detection
//!
//! Remembers the last-seen foreground window title and reports when it
//! changes, so the typing stream can be segmented by window.

use tracing::debug;

/// Width of the rule drawn under window markers and at session end
pub const RULE_WIDTH: usize = 50;

/// A rule of `=` characters, [`RULE_WIDTH`] wide
pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Strip the `*` characters some title bars carry
pub fn normalize_title(title: &str) -> String {
    title.chars().filter(|&c| c != '*').collect()
}

/// Tracks the title of the last foreground window seen
#[derive(Debug, Default)]
pub struct WindowTracker {
    title: Option<String>,
}

impl WindowTracker {
    /// Create a tracker that has not seen any window yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored (normalized) title, if any window was observed
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Observe the current foreground title
    ///
    /// Returns `true` when the normalized title differs from the stored one,
    /// including the very first observation.
    pub fn observe(&mut self, current: &str) -> bool {
        let normalized = normalize_title(current);
        if self.title.as_deref() == Some(normalized.as_str()) {
            return false;
        }

        debug!(from = ?self.title, to = %normalized, "foreground window changed");
        self.title = Some(normalized);
        true
    }

    /// Forget the stored title so the next observation counts as a change
    pub fn reset(&mut self) {
        self.title = None;
    }
}
