//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual pages (in progress, processed, failed, etc.)
//! - `VisitedSet`: The per-run dedup structure that claims each URL at most once

mod page_state;
mod visited;

// Re-export main types
pub use page_state::PageState;
pub use visited::{VisitError, VisitedSet};
