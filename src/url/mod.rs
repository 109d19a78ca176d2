//! URL handling module for Sumi-Trawl
//!
//! This module provides seed validation, link resolution against a page URL,
//! and the mapping from URLs to local file names.

mod filename;
mod resolve;

// Re-export main functions
pub use filename::derive_file_name;
pub use resolve::{parse_seed_url, resolve_link};

/// Suffix for page text files
pub const TEXT_EXTENSION: &str = ".txt";
