//! Application configuration loaded from `config.toml` and `ARMYBOOK_*`
//! environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    army::{DEFAULT_ARMY_KEY, DEFAULT_EXPORT_FILE},
    collection::DEFAULT_COLLECTION_KEY,
    storage::file::sanitize_key,
};

/// Directory name under the platform config/data roots.
pub const APP_DIR: &str = "armybook";

const ENV_PREFIX: &str = "ARMYBOOK";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# armybook configuration
#
# Every value may also be set through the environment, e.g.
# ARMYBOOK_DATA_DIR=/tmp/armybook

# Directory holding the collection and army list files.
# data_dir = "~/.local/share/armybook"

# Storage keys (file names inside data_dir, without extension).
collection_key = "wh40kCollection"
army_key = "wh40kArmyList"

# Where the army list is written when exported.
export_path = "army-list.txt"

# Ask before deleting collection items.
confirm_delete = true
"#;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for the file-backed key-value store.
    pub data_dir: PathBuf,
    /// Storage key of the collection.
    pub collection_key: String,
    /// Storage key of the army list.
    pub army_key: String,
    /// Target file for army list exports.
    pub export_path: PathBuf,
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Whether deleting a collection item asks for confirmation.
    pub confirm_delete: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            army_key: DEFAULT_ARMY_KEY.to_string(),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            confirm_delete: true,
        }
    }
}

impl AppConfig {
    /// Load from the default config file plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from `path` (optional) plus environment overrides. Unset values
    /// fall back to [`AppConfig::default`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.data_dir = expand_home(&config.data_dir);
        config.log_dir = expand_home(&config.log_dir);
        config.export_path = expand_home(&config.export_path);
        config.check_keys()?;
        Ok(config)
    }

    /// The collection and the army list must land in different files.
    fn check_keys(&self) -> Result<()> {
        let collection = sanitize_key(&self.collection_key);
        let army = sanitize_key(&self.army_key);
        if collection.eq_ignore_ascii_case(&army) {
            bail!(
                "collection_key '{}' and army_key '{}' both use the file {collection}.json",
                self.collection_key,
                self.army_key
            );
        }
        Ok(())
    }
}

/// `<config_dir>/armybook/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// `<data_dir>/armybook`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write the commented default config if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
