//! Flat output directory shared by the page processor and the media pool
//!
//! Every file is first written under a hidden temporary name in the same
//! directory and then renamed onto its final name, so a reader never sees a
//! half-written file at a derived path.

use crate::storage::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// The output directory of a crawl run
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl LocalStorage {
    /// Opens the output directory, creating it (and its parents) if needed
    ///
    /// # Returns
    ///
    /// * `Ok(LocalStorage)` - The directory exists and is a directory
    /// * `Err(StorageError)` - It could not be created or is a regular file
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;

        let metadata = std::fs::metadata(&root).map_err(|e| StorageError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(root));
        }

        Ok(Self {
            root,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a derived file name inside the output directory
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Returns whether a file with this name already exists
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Writes `text` to `name`, replacing any previous file
    pub async fn write_text(&self, name: &str, text: &str) -> StorageResult<PathBuf> {
        let mut staged = self.stage(name).await?;
        staged.write_all(text.as_bytes()).await?;
        staged.commit().await
    }

    /// Opens a temporary file that becomes `name` on [`StagedFile::commit`]
    pub async fn stage(&self, name: &str) -> StorageResult<StagedFile> {
        let seq = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        // Independent of `name` so a derived name at the length limit still stages
        let temp_path = self
            .root
            .join(format!(".trawl-{}-{}.part", std::process::id(), seq));
        let final_path = self.path_for(name);

        let file = File::create(&temp_path)
            .await
            .map_err(|e| StorageError::io(&temp_path, e))?;

        Ok(StagedFile {
            file: Some(file),
            temp_path,
            final_path,
            written: 0,
            committed: false,
        })
    }
}

/// A file being written under a temporary name
///
/// Dropping it without calling [`StagedFile::commit`] (an error, or the
/// owning task being cancelled) removes the temporary file.
#[derive(Debug)]
pub struct StagedFile {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
    committed: bool,
}

impl StagedFile {
    pub async fn write_all(&mut self, bytes: &[u8]) -> StorageResult<()> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Ok(()),
        };
        file.write_all(bytes)
            .await
            .map_err(|e| StorageError::io(&self.temp_path, e))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes the data and atomically renames the file onto its final path
    pub async fn commit(mut self) -> StorageResult<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| StorageError::io(&self.temp_path, e))?;
            file.sync_all()
                .await
                .map_err(|e| StorageError::io(&self.temp_path, e))?;
        }

        fs::rename(&self.temp_path, &self.final_path)
            .await
            .map_err(|e| StorageError::io(&self.final_path, e))?;

        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            drop(self.file.take());
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}
