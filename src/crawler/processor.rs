//! Page processor
//!
//! Turns one fetched and parsed page into its outputs: the text file, the media
//! jobs handed to the pool, and the links handed back to the coordinator. The
//! processor never touches the visited set.

use crate::crawler::media::{MediaJob, MediaPool, Submission};
use crate::crawler::parser::ParsedPage;
use crate::storage::LocalStorage;
use crate::url::{derive_file_name, TEXT_EXTENSION};
use std::path::PathBuf;
use std::sync::Arc;

/// What processing a page produced
#[derive(Debug, Default)]
pub struct PageOutput {
    /// Links to crawl next (absolute, document order)
    pub links: Vec<String>,
    /// Where the text was written, or None if the write failed
    pub text_path: Option<PathBuf>,
    /// Media jobs handed to a worker
    pub media_dispatched: usize,
    /// Media jobs skipped or rejected by the pool
    pub media_not_dispatched: usize,
}

/// Writes page text and submits page media
pub struct PageProcessor {
    storage: Arc<LocalStorage>,
    media: Arc<MediaPool>,
}

impl PageProcessor {
    pub fn new(storage: Arc<LocalStorage>, media: Arc<MediaPool>) -> Self {
        Self { storage, media }
    }

    /// The page's rendered body text
    pub fn extract_text(page: &ParsedPage) -> &str {
        &page.text
    }

    /// One job per image/video with a resolvable source
    pub fn extract_media_jobs(&self, page: &ParsedPage) -> Vec<MediaJob> {
        page.media
            .iter()
            .map(|media| MediaJob::new(&media.url, media.kind, &self.storage))
            .collect()
    }

    /// Absolute URLs of every followable anchor
    pub fn extract_links(page: &ParsedPage) -> Vec<String> {
        page.links.clone()
    }

    /// Writes the text file for `url` and submits the page's media
    ///
    /// A failed text write is logged and reported through
    /// [`PageOutput::text_path`]; it does not stop media or links.
    pub async fn process(&self, url: &str, page: &ParsedPage) -> PageOutput {
        let mut output = PageOutput::default();

        let text_name = derive_file_name(url, TEXT_EXTENSION);
        match self
            .storage
            .write_text(&text_name, Self::extract_text(page))
            .await
        {
            Ok(path) => {
                tracing::debug!("Wrote text for {} to {}", url, path.display());
                output.text_path = Some(path);
            }
            Err(e) => {
                tracing::warn!("Failed to write text for {}: {}", url, e);
            }
        }

        for job in self.extract_media_jobs(page) {
            match self.media.submit(job) {
                Submission::Dispatched(_) => output.media_dispatched += 1,
                Submission::Skipped | Submission::Rejected => output.media_not_dispatched += 1,
            }
        }

        output.links = Self::extract_links(page);
        output
    }
}
