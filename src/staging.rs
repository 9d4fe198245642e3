//! Staging directories for inter-stage hand-off.
//!
//! `raw/` holds transient per-city payload blobs consumed by the
//! transformer; `normalized/` holds the durable per-city records consumed
//! by the rate and aggregate stages. Both are destroyed and recreated at
//! pipeline start to guarantee a clean run.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StagingDirs {
    raw: PathBuf,
    normalized: PathBuf,
}

impl StagingDirs {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            raw: work_dir.join("raw"),
            normalized: work_dir.join("normalized"),
        }
    }

    /// Destroys any pre-existing contents and recreates both directories.
    pub fn create_fresh(&self) -> Result<()> {
        for dir in [&self.raw, &self.normalized] {
            if dir.exists() {
                debug!(dir = %dir.display(), "Removing stale staging directory");
                fs::remove_dir_all(dir)?;
            }
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn raw_path(&self, city: &str) -> PathBuf {
        self.raw.join(format!("{city}.json"))
    }

    pub fn normalized_path(&self, city: &str) -> PathBuf {
        self.normalized.join(format!("{city}.json"))
    }

    pub fn normalized_dir(&self) -> &Path {
        &self.normalized
    }

    /// Removes the transient raw directory once the transform stage joins.
    pub fn remove_raw(&self) -> Result<()> {
        if self.raw.exists() {
            fs::remove_dir_all(&self.raw)?;
        }
        Ok(())
    }

    /// Removes the durable directory once the aggregator has finished.
    pub fn remove_normalized(&self) -> Result<()> {
        if self.normalized.exists() {
            fs::remove_dir_all(&self.normalized)?;
        }
        Ok(())
    }
}
