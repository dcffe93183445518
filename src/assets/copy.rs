//! Copy execution.
//!
//! # Responsibilities
//! - Verify every planned source exists before touching the destination tree
//! - Create intermediate directories and copy bytes exactly
//! - Skip destinations whose BLAKE3 hash already matches the source

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;

use super::{AssetError, CopyPlan};

/// Outcome of executing a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Destinations written in this run.
    pub copied: Vec<PathBuf>,
    /// Destinations already identical to their source.
    pub unchanged: Vec<PathBuf>,
}

/// Execute a copy plan.
pub fn execute(plan: &CopyPlan) -> Result<CopyReport, AssetError> {
    // 1. Every source must exist before anything is written
    for task in &plan.tasks {
        if !task.source.is_file() {
            return Err(AssetError::MissingSource {
                index: task.index,
                path: task.source.clone(),
            });
        }
    }

    // 2. Copy
    let mut report = CopyReport::default();
    for task in &plan.tasks {
        if task.destination.is_file() && hash_file(&task.source)? == hash_file(&task.destination)? {
            tracing::debug!(destination = %task.destination.display(), "Asset unchanged");
            report.unchanged.push(task.destination.clone());
            continue;
        }

        if let Some(parent) = task.destination.parent() {
            fs::create_dir_all(parent).map_err(|source| AssetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let bytes = fs::copy(&task.source, &task.destination).map_err(|source| AssetError::Io {
            path: task.destination.clone(),
            source,
        })?;

        tracing::info!(
            source = %task.source.display(),
            destination = %task.destination.display(),
            bytes,
            "Asset staged"
        );
        report.copied.push(task.destination.clone());
    }

    tracing::info!(
        variant = %plan.variant,
        copied = report.copied.len(),
        unchanged = report.unchanged.len(),
        "Asset staging complete"
    );
    Ok(report)
}

/// BLAKE3 hex digest of a file's contents.
pub fn hash_file(path: &Path) -> Result<String, AssetError> {
    let io_err = |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(io_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
