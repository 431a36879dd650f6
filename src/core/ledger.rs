// src/core/ledger.rs
//! Append-only CSV application ledger

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::tracker::{TrackerRow, TRACKER_HEADER};

/// The tracking ledger. Rows are only ever appended; existing rows are never
/// rewritten or reordered. The file handle is opened on the first append and
/// flushed after every row.
///
/// Concurrent processes appending to the same file need external locking.
pub struct TrackerLedger {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl TrackerLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first when the file is new or empty.
    pub fn append(&mut self, row: &TrackerRow) -> Result<()> {
        let path = self.path.clone();
        let writer = self.writer()?;
        writer
            .serialize(row)
            .with_context(|| format!("Failed to append row to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush ledger {}", path.display()))?;

        info!("Appended ledger row for job {} to {}", row.job_id, path.display());
        Ok(())
    }

    /// Flush and release the file handle. The next append reopens it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush ledger {}", self.path.display()))?;
        }
        Ok(())
    }

    /// All rows currently in the ledger, in file order.
    pub fn read_rows(&self) -> Result<Vec<TrackerRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;

        reader
            .deserialize()
            .collect::<std::result::Result<Vec<TrackerRow>, _>>()
            .with_context(|| format!("Failed to parse ledger {}", self.path.display()))
    }

    fn writer(&mut self) -> Result<&mut csv::Writer<File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create ledger directory: {}", parent.display())
                })?;
            }

            let needs_header = std::fs::metadata(&self.path)
                .map(|m| m.len() == 0)
                .unwrap_or(true);

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;

            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);

            if needs_header {
                writer
                    .write_record(TRACKER_HEADER)
                    .context("Failed to write ledger header")?;
                info!("Created ledger {}", self.path.display());
            }
            self.writer = Some(writer);
        }

        self.writer
            .as_mut()
            .context("Ledger writer was not initialised")
    }
}

impl Drop for TrackerLedger {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Header plus one row, as the CSV text carried in the output bundle.
pub fn row_to_csv(row: &TrackerRow) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(TRACKER_HEADER)?;
    writer.serialize(row)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV buffer: {}", e))?;
    String::from_utf8(bytes).context("Ledger CSV is not valid UTF-8")
}
