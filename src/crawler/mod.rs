//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and error classification
//! - HTML parsing into text, links and media
//! - The page processor that writes text and submits media
//! - The bounded media download pool
//! - The frontier queue and overall crawl coordination

mod coordinator;
mod fetcher;
mod media;
mod parser;
mod processor;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, build_media_client, fetch_page, is_html_content_type, FetchResult,
};
pub use media::{
    DownloadOutcome, DrainReport, MediaError, MediaJob, MediaKind, MediaPool, MediaTicket,
    PoolStats, Submission, DEFAULT_MEDIA_CAPACITY,
};
pub use parser::{parse_page, MediaRef, ParsedPage};
pub use processor::{PageOutput, PageProcessor};
pub use scheduler::{CrawlTask, Scheduler};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::TrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed URL and open the output directory
/// 2. Build the HTTP clients and the media pool
/// 3. Traverse pages breadth-first up to the configured depth
/// 4. Write page text and download media
/// 5. Drain the media pool and report statistics
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl ran to completion
/// * `Err(TrawlError)` - Startup failed; nothing was fetched
pub async fn crawl(config: Config, seed: &str) -> Result<CrawlStatistics, TrawlError> {
    run_crawl(config, seed).await
}
