// User config file handling

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub output_format: Option<String>,
    pub store_path: Option<String>,
    /// Hex private key used by `demo` instead of a throwaway key
    pub signer_key: Option<String>,
}

pub const KEYS: [&str; 3] = ["output_format", "store_path", "signer_key"];

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Set one key, validating its value
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        match key {
            "output_format" => {
                if value != "pretty" && value != "json" {
                    anyhow::bail!("Invalid output_format '{value}'. Valid values: pretty, json");
                }
                self.output_format = Some(value);
            }
            "store_path" => self.store_path = Some(value),
            "signer_key" => {
                tripseal_core::LocalSigner::from_hex(&value)?;
                self.signer_key = Some(value);
            }
            _ => anyhow::bail!(
                "Unknown config key '{key}'.\n\n\
                Valid keys:\n  \
                  output_format   (pretty or json)\n  \
                  store_path      (e.g., /path/to/capabilities)\n  \
                  signer_key      (hex private key)"
            ),
        }
        Ok(())
    }

    pub fn project_dirs() -> Result<ProjectDirs> {
        // Linux: ~/.config/tripseal/ and ~/.local/share/tripseal/
        ProjectDirs::from("io", "tripseal", "tripseal")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("output_format", "json".into()).unwrap();
        config.set("store_path", "/tmp/caps".into()).unwrap();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_set_validates() {
        let mut config = Config::default();
        assert!(config.set("output_format", "yaml".into()).is_err());
        assert!(config.set("signer_key", "nope".into()).is_err());
        assert!(config.set("colour", "blue".into()).is_err());
        assert_eq!(config, Config::default());
    }
}
