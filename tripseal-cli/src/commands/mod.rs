pub mod capability;
pub mod config;
pub mod demo;
pub mod proof;
pub mod trips;

use std::path::PathBuf;

use anyhow::{Context as AnyhowContext, Result};
use tripseal_storage::LocalFileCapabilityStore;

/// Global context passed to all commands
pub struct Context {
    pub json_output: bool,
    pub store_override: Option<PathBuf>,
    pub verbose: bool,
}

impl Context {
    /// `--json` wins; otherwise the config file's `output_format`
    pub fn wants_json(&self) -> Result<bool> {
        if self.json_output {
            return Ok(true);
        }
        let config = crate::config::Config::load()?;
        Ok(config.output_format.as_deref() == Some("json"))
    }

    /// Resolve the capability store directory, with priority:
    /// 1. --store flag (or TRIPSEAL_STORE)
    /// 2. Config file store_path
    /// 3. Platform data directory
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_override {
            return Ok(path.clone());
        }

        let config = crate::config::Config::load()?;
        if let Some(path) = config.store_path {
            return Ok(PathBuf::from(path));
        }

        Ok(crate::config::Config::project_dirs()?.data_dir().to_path_buf())
    }

    pub async fn open_store(&self) -> Result<LocalFileCapabilityStore> {
        let path = self.store_path()?;
        tracing::debug!(path = %path.display(), "opening capability store");
        LocalFileCapabilityStore::new(&path)
            .await
            .with_context(|| format!("Failed to open capability store at {}", path.display()))
    }
}
