//! Statistics for a finished crawl run

use crate::crawler::DrainReport;
use crate::state::PageState;
use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Seed URL the run started from
    pub seed: String,

    /// Number of distinct URLs claimed in the visited set
    pub pages_visited: usize,

    /// Count of claimed pages by state
    pub pages_by_state: HashMap<PageState, usize>,

    /// Links dropped because they were beyond the maximum depth
    pub depth_skipped: usize,

    /// Links dropped because their URL had already been claimed
    pub duplicate_links: usize,

    /// Pages whose text file could not be written
    pub text_write_failures: usize,

    /// Media jobs handed to a download worker
    pub media_dispatched: usize,

    /// Final media pool counts
    pub media: DrainReport,

    /// Wall time from first fetch to drained pool
    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Number of pages in `state`
    pub fn pages_in(&self, state: PageState) -> usize {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Number of pages successfully processed
    pub fn processed(&self) -> usize {
        self.pages_in(PageState::Processed)
    }

    /// Number of pages whose fetch failed in any way
    pub fn failed(&self) -> usize {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_error())
            .map(|(_, count)| *count)
            .sum()
    }
}

/// Renders statistics as the multi-line report printed after a crawl
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Seed: {}", stats.seed);
    let _ = writeln!(out, "  Pages visited: {}", stats.pages_visited);
    let _ = writeln!(out, "  Links beyond max depth: {}", stats.depth_skipped);
    let _ = writeln!(out, "  Duplicate links: {}", stats.duplicate_links);
    let _ = writeln!(out, "  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "Pages by State:");
    let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    for (state, count) in state_counts {
        let percentage = if stats.pages_visited > 0 {
            (*count as f64 / stats.pages_visited as f64) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "  {}: {} ({:.1}%)", state, count, percentage);
    }
    let _ = writeln!(out);

    if stats.text_write_failures > 0 {
        let _ = writeln!(out, "Text write failures: {}", stats.text_write_failures);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Media:");
    let _ = writeln!(out, "  Dispatched: {}", stats.media_dispatched);
    let _ = writeln!(out, "  Downloaded: {}", stats.media.downloaded);
    let _ = writeln!(out, "  Failed: {}", stats.media.failed);
    let _ = writeln!(out, "  Skipped (already present): {}", stats.media.skipped);
    if stats.media.rejected > 0 {
        let _ = writeln!(out, "  Rejected after drain: {}", stats.media.rejected);
    }
    if stats.media.timed_out {
        let _ = writeln!(
            out,
            "  Cancelled at drain timeout: {}",
            stats.media.cancelled
        );
    }
    let _ = writeln!(out);

    let _ = write!(
        out,
        "Success Rate: {} / {} pages successfully processed",
        stats.processed(),
        stats.pages_visited
    );

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("{}", format_statistics(stats));
}
