/// Page state definitions for tracking crawl progress
///
/// A URL enters the visited set as `InProgress` when it is claimed and moves to
/// exactly one terminal state once its fetch has been handled.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page has been claimed and is being fetched/processed
    InProgress,

    // ===== Terminal Success States =====
    /// Page was fetched, its text written and its media/links handed off
    Processed,

    // ===== Terminal Error States =====
    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Page could not be reached (connection refused, DNS failure, timeout)
    Unreachable,

    /// Page Content-Type is not HTML
    ContentMismatch,

    /// Page fetch failed for other reasons (non-2xx status, body read error)
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadLink | Self::Unreachable | Self::ContentMismatch | Self::Failed
        )
    }

    /// Whether a page in this state may move to `next`
    ///
    /// Only `InProgress -> terminal` is allowed; terminal states are final.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        self.is_active() && next.is_terminal()
    }

    /// Short, stable name used in logs and statistics output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Processed => "processed",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::ContentMismatch => "content_mismatch",
            Self::Failed => "failed",
        }
    }

    /// Returns all terminal page states
    pub fn terminal_states() -> [Self; 5] {
        [
            Self::Processed,
            Self::DeadLink,
            Self::Unreachable,
            Self::ContentMismatch,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
