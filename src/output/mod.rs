//! Output module for end-of-run reporting
//!
//! Page text and media are written by the crawler itself; this module only
//! summarizes what a run did.

mod stats;

pub use stats::{format_statistics, print_statistics, CrawlStatistics};
