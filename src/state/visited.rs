//! Visited set shared by the traversal workers of one crawl run

use crate::state::PageState;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Rejected state change on a visited URL
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisitError {
    #[error("URL was never claimed: {0}")]
    NotClaimed(String),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: PageState,
        to: PageState,
    },
}

/// Set of URLs already claimed for crawling, with the state of each
///
/// Keys are exact URL strings; no normalization is applied. Claiming is a
/// single locked test-and-insert, so two workers racing on the same URL can
/// never both proceed.
#[derive(Debug, Default)]
pub struct VisitedSet {
    pages: Mutex<HashMap<String, PageState>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn pages(&self) -> MutexGuard<'_, HashMap<String, PageState>> {
        // A panicking holder cannot leave the map half-updated
        self.pages.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims `url` for crawling
    ///
    /// Returns `true` if the URL was unvisited and is now `InProgress`,
    /// `false` if it had already been claimed.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut pages = self.pages();
        if pages.contains_key(url) {
            return false;
        }
        pages.insert(url.to_string(), PageState::InProgress);
        true
    }

    /// Records the terminal state of a claimed URL
    pub fn complete(&self, url: &str, state: PageState) -> Result<(), VisitError> {
        let mut pages = self.pages();
        let current = pages
            .get_mut(url)
            .ok_or_else(|| VisitError::NotClaimed(url.to_string()))?;

        if !current.can_transition_to(state) {
            return Err(VisitError::InvalidTransition {
                url: url.to_string(),
                from: *current,
                to: state,
            });
        }

        *current = state;
        Ok(())
    }

    /// Returns whether `url` has been claimed
    pub fn contains(&self, url: &str) -> bool {
        self.pages().contains_key(url)
    }

    /// Returns the current state of `url`, if it has been claimed
    pub fn state_of(&self, url: &str) -> Option<PageState> {
        self.pages().get(url).copied()
    }

    /// Number of claimed URLs
    pub fn len(&self) -> usize {
        self.pages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages().is_empty()
    }

    /// Counts claimed URLs by state
    pub fn count_by_state(&self) -> HashMap<PageState, usize> {
        let mut counts = HashMap::new();
        for state in self.pages().values() {
            *counts.entry(*state).or_insert(0) += 1;
        }
        counts
    }

    /// Returns a sorted snapshot of every claimed URL
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.pages().keys().cloned().collect();
        urls.sort();
        urls
    }
}
