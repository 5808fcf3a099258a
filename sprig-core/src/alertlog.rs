//! Append-only alert log with size-bounded rotation.
//!
//! Alerts are plain `[DD-MM HH:MM] message` lines so the external AI
//! front end can feed the file to a language model as-is. When the live
//! file outgrows the bound it is gzipped into a uniquely stamped archive
//! and truncated, synchronously with the append that crossed the line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use crate::error::LogError;

/// Rotation bound for the live log, in bytes (~50 KB).
pub const ROTATE_BYTES: u64 = 50_000;

pub struct AlertLog {
    path: PathBuf,
    rotate_bytes: u64,
}

impl AlertLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rotate_bytes: ROTATE_BYTES,
        }
    }

    /// Override the rotation bound; tests use a small one.
    pub fn with_rotate_bytes(path: impl Into<PathBuf>, rotate_bytes: u64) -> Self {
        Self {
            path: path.into(),
            rotate_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one stamped alert line, then rotate if the file crossed the
    /// size bound. The next append after a rotation starts a fresh log.
    pub fn append(&self, message: &str) -> Result<(), LogError> {
        let stamp = jiff::Zoned::now().strftime("%d-%m %H:%M");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{stamp}] {message}")?;
        drop(file);

        if fs::metadata(&self.path)?.len() > self.rotate_bytes {
            self.rotate()?;
        }
        Ok(())
    }

    fn rotate(&self) -> Result<(), LogError> {
        let stamp = jiff::Zoned::now().strftime("%Y%m%d_%H%M%S");
        let archive_path = self.path.with_file_name(format!("alerts_{stamp}.log.gz"));

        let mut live = File::open(&self.path)?;
        let mut encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
        io::copy(&mut live, &mut encoder)?;
        encoder.finish()?;

        // Truncate only after the archive is safely on disk.
        File::create(&self.path)?;
        info!(archive = %archive_path.display(), "Alert log rotated");
        Ok(())
    }
}
