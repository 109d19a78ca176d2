//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The FIFO work queue of discovered pages (breadth-first order)
//! - Enforcing the maximum crawl depth before anything is queued
//! - Counting links dropped for exceeding the depth bound

use std::collections::VecDeque;

/// A page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Absolute URL to fetch
    pub url: String,

    /// Link hops from the seed (seed is 0)
    pub depth: u32,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    /// Task for a link discovered on this task's page
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self::new(url, self.depth + 1)
    }
}

/// Scheduler manages the frontier queue
///
/// Tasks beyond `max_depth` are refused at the door, so nothing deeper than
/// the bound is ever fetched. Dedup is not the scheduler's job; the
/// coordinator claims URLs in the visited set as it dequeues them.
#[derive(Debug)]
pub struct Scheduler {
    /// Frontier queue of pages to fetch
    frontier: VecDeque<CrawlTask>,

    /// Maximum crawl depth (inclusive)
    max_depth: u32,

    /// Links refused for exceeding `max_depth`
    depth_skipped: usize,
}

impl Scheduler {
    /// Creates a new scheduler with an empty frontier
    pub fn new(max_depth: u32) -> Self {
        Self {
            frontier: VecDeque::new(),
            max_depth,
            depth_skipped: 0,
        }
    }

    /// Adds a task to the back of the frontier
    ///
    /// # Returns
    ///
    /// * `true` - The task was queued
    /// * `false` - The task is deeper than `max_depth` and was dropped
    pub fn add_to_frontier(&mut self, task: CrawlTask) -> bool {
        if task.depth > self.max_depth {
            tracing::trace!(
                "Dropping {} at depth {} (max {})",
                task.url,
                task.depth,
                self.max_depth
            );
            self.depth_skipped += 1;
            return false;
        }

        self.frontier.push_back(task);
        true
    }

    /// Takes the next task from the front of the frontier
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        self.frontier.pop_front()
    }

    /// Returns the number of tasks in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of tasks dropped for exceeding the depth bound
    pub fn depth_skipped(&self) -> usize {
        self.depth_skipped
    }
}
