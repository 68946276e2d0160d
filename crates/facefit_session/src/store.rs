//! Persisted manual adjustment
//!
//! The adjustment record is the only state kept between runs. A missing or
//! unreadable file means "nothing saved"; it never fails a load.

use std::path::{Path, PathBuf};

use facefit_pose::ManualAdjustment;

use crate::error::Result;

/// JSON file holding a [`ManualAdjustment`]
#[derive(Clone, Debug)]
pub struct AdjustmentStore {
    path: PathBuf,
}

impl AdjustmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved adjustment, or defaults when nothing usable is stored
    ///
    /// Fields missing from the file take their defaults one by one.
    pub fn load(&self) -> ManualAdjustment {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("No saved adjustment at {}: {}", self.path.display(), e);
                return ManualAdjustment::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(adjustment) => {
                log::info!("Loaded adjustment from {}", self.path.display());
                adjustment
            }
            Err(e) => {
                log::warn!("Discarding unreadable adjustment {}: {}", self.path.display(), e);
                ManualAdjustment::default()
            }
        }
    }

    pub fn save(&self, adjustment: &ManualAdjustment) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(adjustment).map_err(std::io::Error::from)?;
        std::fs::write(&self.path, json)?;
        log::info!("Saved adjustment to {}", self.path.display());
        Ok(())
    }
}
