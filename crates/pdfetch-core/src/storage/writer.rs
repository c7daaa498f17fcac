//! Sequential writer for one artifact's temp file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{remove_if_exists, temp_path};

/// Writer for `<final>.part`. Removes the temp file on drop unless `finalize`
/// succeeded.
pub struct ArtifactWriter {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    bytes_written: u64,
}

impl ArtifactWriter {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(ArtifactWriter {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Append `data` to the temp file.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .context("artifact writer already closed")?;
        file.write_all(data).context("artifact write failed")?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush().context("artifact flush failed")?;
            file.sync_all().context("artifact sync failed")?;
        }
        Ok(())
    }

    /// Atomically rename the temp file to the final path and close it.
    pub fn finalize(mut self) -> Result<PathBuf> {
        drop(self.file.take());
        std::fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;
        // Nothing left to clean up.
        self.temp_path = PathBuf::new();
        Ok(self.final_path.clone())
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.temp_path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = remove_if_exists(&self.temp_path) {
            tracing::warn!(path = %self.temp_path.display(), "could not remove temp file: {}", e);
        }
    }
}
