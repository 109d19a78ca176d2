//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Opening the output directory and building HTTP clients
//! - Claiming URLs in the visited set
//! - Running page fetches on a bounded set of traversal tasks
//! - Feeding discovered links back into the frontier
//! - Draining the media pool once traversal is exhausted

use crate::config::Config;
use crate::crawler::media::MediaPool;
use crate::crawler::parser::parse_page;
use crate::crawler::processor::PageProcessor;
use crate::crawler::scheduler::{CrawlTask, Scheduler};
use crate::crawler::{build_http_client, build_media_client, fetch_page, FetchResult};
use crate::output::CrawlStatistics;
use crate::state::{PageState, VisitedSet};
use crate::storage::LocalStorage;
use crate::url::parse_seed_url;
use crate::TrawlError;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Outcome of crawling one page, sent back to the coordinator loop
#[derive(Debug)]
struct PageResult {
    task: CrawlTask,
    state: PageState,
    links: Vec<String>,
    text_written: bool,
    media_dispatched: usize,
}

impl PageResult {
    fn failed(task: CrawlTask, state: PageState) -> Self {
        Self {
            task,
            state,
            links: Vec::new(),
            text_written: false,
            media_dispatched: 0,
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns everything scoped to one crawl run: the visited set, the media pool
/// and the output directory. [`Coordinator::run`] consumes it, so the pool is
/// drained exactly once.
pub struct Coordinator {
    config: Arc<Config>,
    seed: Url,
    client: Client,
    storage: Arc<LocalStorage>,
    visited: Arc<VisitedSet>,
    media: Arc<MediaPool>,
    processor: Arc<PageProcessor>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// All startup failures surface here, before any request is made.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(TrawlError)` - Bad seed URL, unusable output directory, or the
    ///   HTTP clients could not be built
    pub fn new(config: Config, seed: &str) -> Result<Self, TrawlError> {
        let seed = parse_seed_url(seed)?;

        let storage = Arc::new(LocalStorage::open(&config.output.directory)?);
        tracing::info!("Writing output to {}", storage.root().display());

        let client = build_http_client(&config.crawler, &config.user_agent)?;
        let media_client = build_media_client(&config.crawler, &config.user_agent)?;

        let media = Arc::new(MediaPool::new(
            media_client,
            Arc::clone(&storage),
            config.media.max_concurrent_downloads as usize,
        ));
        let processor = Arc::new(PageProcessor::new(
            Arc::clone(&storage),
            Arc::clone(&media),
        ));

        Ok(Self {
            config: Arc::new(config),
            seed,
            client,
            storage,
            visited: Arc::new(VisitedSet::new()),
            media,
            processor,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn output_dir(&self) -> &Path {
        self.storage.root()
    }

    /// Runs the crawl to completion
    ///
    /// 1. Seeds the frontier with the seed URL at depth 0
    /// 2. Dequeues tasks in FIFO order, skipping URLs already claimed
    /// 3. Keeps up to `traversal-workers` page fetches in flight
    /// 4. Queues links of successfully fetched pages at depth + 1
    /// 5. When the frontier is empty and nothing is in flight, drains the
    ///    media pool for at most `drain-timeout`
    pub async fn run(self) -> CrawlStatistics {
        let start_time = Instant::now();
        let workers = self.config.crawler.traversal_workers.max(1) as usize;

        let mut scheduler = Scheduler::new(self.config.crawler.max_depth);
        scheduler.add_to_frontier(CrawlTask::new(self.seed.as_str(), 0));

        let mut stats = CrawlStatistics {
            seed: self.seed.to_string(),
            ..CrawlStatistics::default()
        };

        tracing::info!(
            "Starting crawl from {} (max depth {}, {} traversal workers, {} media workers)",
            self.seed,
            scheduler.max_depth(),
            workers,
            self.media.capacity()
        );

        let mut in_flight: JoinSet<PageResult> = JoinSet::new();
        let mut pages_crawled = 0usize;

        loop {
            // Top up in-flight page tasks
            while in_flight.len() < workers {
                let task = match scheduler.next_task() {
                    Some(task) => task,
                    None => break,
                };

                if !self.visited.try_claim(&task.url) {
                    stats.duplicate_links += 1;
                    tracing::trace!("Already visited: {}", task.url);
                    continue;
                }

                in_flight.spawn(crawl_page(
                    self.client.clone(),
                    Arc::clone(&self.processor),
                    task,
                ));
            }

            // Reap one completed page
            let joined = match in_flight.join_next().await {
                Some(joined) => joined,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
            };

            let page = match joined {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Traversal task failed: {}", e);
                    continue;
                }
            };

            if let Err(e) = self.visited.complete(&page.task.url, page.state) {
                tracing::warn!("{}", e);
            }

            if page.state.is_success() && !page.text_written {
                stats.text_write_failures += 1;
            }
            stats.media_dispatched += page.media_dispatched;

            for link in page.links {
                scheduler.add_to_frontier(page.task.child(link));
            }

            pages_crawled += 1;
            if pages_crawled % 10 == 0 {
                let rate = pages_crawled as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    pages_crawled,
                    scheduler.frontier_size(),
                    rate
                );
            }
        }

        stats.depth_skipped = scheduler.depth_skipped();

        let drain_timeout = Duration::from_secs(self.config.media.drain_timeout);
        stats.media = self.media.drain(drain_timeout).await;

        stats.pages_visited = self.visited.len();
        stats.pages_by_state = self.visited.count_by_state();
        stats.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl completed: {} pages visited, {} media downloaded in {:?}",
            stats.pages_visited,
            stats.media.downloaded,
            stats.elapsed
        );

        stats
    }
}

/// Fetches one page and, on success, hands it to the page processor
async fn crawl_page(client: Client, processor: Arc<PageProcessor>, task: CrawlTask) -> PageResult {
    tracing::debug!("Fetching {} (depth {})", task.url, task.depth);

    let (final_url, body) = match fetch_page(&client, &task.url).await {
        FetchResult::Success {
            final_url, body, ..
        } => (final_url, body),
        failure => {
            tracing::warn!("Error crawling {}: {}", task.url, failure.describe());
            return PageResult::failed(task, failure.page_state());
        }
    };

    // Relative links resolve against where the page actually came from
    let base_url = match Url::parse(&final_url).or_else(|_| Url::parse(&task.url)) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot resolve links for {}: {}", task.url, e);
            return PageResult::failed(task, PageState::Failed);
        }
    };

    let parsed = parse_page(&body, &base_url);
    match parsed.title.as_deref() {
        Some(title) => tracing::info!("Crawling: {} ({})", task.url, title),
        None => tracing::info!("Crawling: {}", task.url),
    }

    let output = processor.process(&task.url, &parsed).await;

    PageResult {
        state: PageState::Processed,
        links: output.links,
        text_written: output.text_path.is_some(),
        media_dispatched: output.media_dispatched,
        task,
    }
}

/// Runs a complete crawl from `seed`
///
/// # Example
///
/// ```no_run
/// use sumi_trawl::config::Config;
/// use sumi_trawl::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stats = run_crawl(Config::default(), "https://example.com/").await?;
/// println!("{} pages", stats.pages_visited);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, seed: &str) -> Result<CrawlStatistics, TrawlError> {
    let coordinator = Coordinator::new(config, seed)?;
    Ok(coordinator.run().await)
}
