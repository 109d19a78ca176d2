//! Media download pool
//!
//! Images and videos found on crawled pages are downloaded by a fixed number of
//! concurrent workers, independent of the page traversal:
//! - Submission never blocks: jobs wait in an unbounded queue for a permit
//! - Destinations that already exist on disk are skipped
//! - Each download streams into a temporary file that is renamed on success
//! - Failures are logged and counted, never propagated to the traversal
//! - `drain` is the single synchronization point with the end of a crawl

use crate::storage::{LocalStorage, StorageError};
use reqwest::Client;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;

/// Default number of downloads allowed in flight at once
pub const DEFAULT_MEDIA_CAPACITY: usize = 8;

/// Category of a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File suffix appended to derived media names
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => ".img",
            Self::Video => ".video",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One media download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaJob {
    /// Absolute URL of the image/video
    pub source_url: String,
    pub kind: MediaKind,
    /// Derived file name inside the output directory
    pub file_name: String,
    /// Full destination path
    pub destination: PathBuf,
}

impl MediaJob {
    /// Creates a job whose destination is derived from the source URL
    pub fn new(source_url: &str, kind: MediaKind, storage: &LocalStorage) -> Self {
        let file_name = crate::url::derive_file_name(source_url, kind.extension());
        let destination = storage.path_for(&file_name);
        Self {
            source_url: source_url.to_string(),
            kind,
            file_name,
            destination,
        }
    }
}

/// Errors raised by a single download
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Final result of a dispatched job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File written to its destination
    Downloaded { bytes: u64 },
    /// Download abandoned; the message is what was logged
    Failed(String),
}

/// What happened to a submitted job
#[derive(Debug)]
pub enum Submission {
    /// Queued for a worker; the ticket resolves when it finishes
    Dispatched(MediaTicket),
    /// Destination already exists or is already claimed in this run
    Skipped,
    /// The pool is draining and accepts no new work
    Rejected,
}

impl Submission {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }
}

/// Handle on a dispatched download
#[derive(Debug)]
pub struct MediaTicket {
    id: u64,
    outcome: oneshot::Receiver<DownloadOutcome>,
}

impl MediaTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the download to finish
    ///
    /// Returns `None` if the job was cancelled by [`MediaPool::drain`].
    pub async fn wait(self) -> Option<DownloadOutcome> {
        self.outcome.await.ok()
    }
}

/// Counts reported once the pool has been drained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rejected: usize,
    /// Jobs still queued or in flight when the timeout expired
    pub cancelled: usize,
    pub timed_out: bool,
}

/// Point-in-time view of the pool counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub dispatched: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicUsize,
    downloaded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    rejected: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Marks one download as executing for as long as it is alive
struct InFlightGuard {
    counters: Arc<Counters>,
}

impl InFlightGuard {
    fn enter(counters: Arc<Counters>) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { counters }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded pool of concurrent media downloads for one crawl run
pub struct MediaPool {
    client: Client,
    storage: Arc<LocalStorage>,
    permits: Arc<Semaphore>,
    capacity: usize,
    tasks: Mutex<JoinSet<()>>,
    claimed: Mutex<HashSet<PathBuf>>,
    accepting: AtomicBool,
    next_id: AtomicU64,
    counters: Arc<Counters>,
}

impl MediaPool {
    /// Creates a pool allowing `capacity` downloads in flight (at least one)
    pub fn new(client: Client, storage: Arc<LocalStorage>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            client,
            storage,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            tasks: Mutex::new(JoinSet::new()),
            claimed: Mutex::new(HashSet::new()),
            accepting: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues a download
    ///
    /// Never blocks on the download itself. Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, job: MediaJob) -> Submission {
        if !self.accepting.load(Ordering::SeqCst) {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Media pool draining, rejected {}", job.source_url);
            return Submission::Rejected;
        }

        if self.storage.exists(&job.file_name) {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                "Skipping {} {}: {} already exists",
                job.kind,
                job.source_url,
                job.destination.display()
            );
            return Submission::Skipped;
        }

        {
            let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
            if !claimed.insert(job.destination.clone()) {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    "Skipping {} {}: {} already queued",
                    job.kind,
                    job.source_url,
                    job.destination.display()
                );
                return Submission::Skipped;
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let storage = Arc::clone(&self.storage);
        let permits = Arc::clone(&self.permits);
        let counters = Arc::clone(&self.counters);

        counters.dispatched.fetch_add(1, Ordering::Relaxed);

        let mut tasks = self.tasks();
        // Reap finished downloads so the set only holds outstanding work
        while let Some(result) = tasks.try_join_next() {
            self.record_join_error(result);
        }

        tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let _guard = InFlightGuard::enter(Arc::clone(&counters));

            let outcome = match download(&client, &storage, &job).await {
                Ok(bytes) => {
                    counters.downloaded.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        "Downloaded {}: {} ({} bytes)",
                        job.kind,
                        job.destination.display(),
                        bytes
                    );
                    DownloadOutcome::Downloaded { bytes }
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Error downloading {} {}: {}", job.kind, job.source_url, e);
                    DownloadOutcome::Failed(e.to_string())
                }
            };

            // The submitter may not care about the result
            let _ = tx.send(outcome);
        });

        Submission::Dispatched(MediaTicket { id, outcome: rx })
    }

    fn record_join_error(&self, result: Result<(), tokio::task::JoinError>) {
        if let Err(e) = result {
            if e.is_panic() {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Media worker panicked: {}", e);
            }
        }
    }

    /// Current counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            downloaded: self.counters.downloaded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.counters.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Stops accepting jobs and waits up to `timeout` for outstanding ones
    ///
    /// Jobs still queued or downloading when the timeout expires are
    /// cancelled; their temporary files are removed and nothing appears at
    /// their destination.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        self.accepting.store(false, Ordering::SeqCst);
        let mut tasks = std::mem::take(&mut *self.tasks());

        tracing::info!(
            "Draining media pool: {} job(s) outstanding, timeout {:?}",
            tasks.len(),
            timeout
        );

        let finished = tokio::time::timeout(timeout, async {
            while let Some(result) = tasks.join_next().await {
                self.record_join_error(result);
            }
        })
        .await
        .is_ok();

        // Jobs that completed right at the deadline are not cancellations
        while let Some(result) = tasks.try_join_next() {
            self.record_join_error(result);
        }

        let cancelled = tasks.len();
        if !finished {
            tracing::warn!(
                "Media drain timed out after {:?}, cancelling {} job(s)",
                timeout,
                cancelled
            );
            tasks.shutdown().await;
        }

        let stats = self.stats();
        DrainReport {
            downloaded: stats.downloaded,
            failed: stats.failed,
            skipped: stats.skipped,
            rejected: stats.rejected,
            cancelled,
            timed_out: !finished,
        }
    }
}

/// Streams one media body into its destination
async fn download(
    client: &Client,
    storage: &LocalStorage,
    job: &MediaJob,
) -> Result<u64, MediaError> {
    let http_error = |source| MediaError::Http {
        url: job.source_url.clone(),
        source,
    };

    let mut response = client
        .get(&job.source_url)
        .send()
        .await
        .map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::Status {
            url: job.source_url.clone(),
            status: status.as_u16(),
        });
    }

    let mut staged = storage.stage(&job.file_name).await?;
    while let Some(chunk) = response.chunk().await.map_err(http_error)? {
        staged.write_all(&chunk).await?;
    }

    let bytes = staged.written();
    staged.commit().await?;
    Ok(bytes)
}
