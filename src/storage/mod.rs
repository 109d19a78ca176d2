//! Storage module for writing crawl output
//!
//! The crawl writes into a single flat directory: one `.txt` file per page and
//! one `.img`/`.video` file per downloaded media element. There is no manifest
//! or index file.

mod error;
mod local;

pub use error::{StorageError, StorageResult};
pub use local::{LocalStorage, StagedFile};
