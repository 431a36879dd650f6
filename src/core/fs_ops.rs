// src/core/fs_ops.rs
//! File system collaborator: every disk read and write made by the pipeline

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::core::digest::sha256_hex;

/// Largest text file the pipeline will load.
pub const MAX_TEXT_BYTES: u64 = 2_000_000;

/// Side-effecting file operations the controller depends on. Swapped for an
/// in-memory store in tests.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Read a UTF-8 text file.
    async fn read_text(&self, path: &Path) -> Result<String>;

    /// Write a UTF-8 text file, creating parent directories. Fails when the
    /// file exists and `overwrite` is false.
    async fn write_text(&self, path: &Path, content: &str, overwrite: bool) -> Result<()>;

    /// `mkdir -p`; returns whether the directory was newly created.
    async fn create_dir(&self, path: &Path) -> Result<bool>;

    /// SHA-256 hex digest of a file's bytes.
    async fn sha256(&self, path: &Path) -> Result<String>;
}

/// Local disk implementation of [`ArtifactStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOps;

impl FsOps {
    /// Ensure directory exists
    pub async fn ensure_dir_exists(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        info!("Created directory: {}", path.display());
        Ok(true)
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        let metadata = fs::metadata(path)
            .await
            .with_context(|| format!("File not found: {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("Not a file: {}", path.display());
        }
        if metadata.len() > MAX_TEXT_BYTES {
            anyhow::bail!(
                "File too large: {} > {} bytes ({})",
                metadata.len(),
                MAX_TEXT_BYTES,
                path.display()
            );
        }

        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    pub async fn write_file_safe(path: &Path, content: &str, overwrite: bool) -> Result<()> {
        if !overwrite && fs::try_exists(path).await.unwrap_or(false) {
            anyhow::bail!("File exists and overwrite is disabled: {}", path.display());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        info!("Written file: {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    pub async fn file_sha256(path: &Path) -> Result<String> {
        let data = fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let digest = sha256_hex(&data);
        debug!("sha256 {} = {}", path.display(), digest);
        Ok(digest)
    }
}

#[async_trait]
impl ArtifactStore for FsOps {
    async fn read_text(&self, path: &Path) -> Result<String> {
        Self::read_file_safe(path).await
    }

    async fn write_text(&self, path: &Path, content: &str, overwrite: bool) -> Result<()> {
        Self::write_file_safe(path, content, overwrite).await
    }

    async fn create_dir(&self, path: &Path) -> Result<bool> {
        Self::ensure_dir_exists(path).await
    }

    async fn sha256(&self, path: &Path) -> Result<String> {
        Self::file_sha256(path).await
    }
}
