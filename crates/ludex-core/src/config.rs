use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/ludex/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub dedup: DedupSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub library_path: String,

    /// Owner used when the CLI is invoked without `--owner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_owner: Option<Uuid>,
}

/// Tunables for the similarity engine. These are deliberately config
/// values rather than constants so tests can vary the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    /// Minimum score a computed pair needs to be persisted (0–100).
    pub min_similarity_score: u8,
    /// Normalized names shorter than this are too unreliable to compare.
    pub min_normalized_length: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("ludex");

        Self {
            library_path: data_dir.to_string_lossy().to_string(),
            default_owner: None,
        }
    }
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            min_similarity_score: 50,
            min_normalized_length: 4,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/ludex/config.toml`
    pub fn config_path() -> PathBuf {
        // Allow override via env var
        if let Ok(path) = std::env::var("LUDEX_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("ludex")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.library_path).join("ludex.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_engine_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.dedup.min_similarity_score, 50);
        assert_eq!(config.dedup.min_normalized_length, 4);
        assert!(config.core.default_owner.is_none());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.core.default_owner = Some(Uuid::from_u128(42));
        config.dedup.min_similarity_score = 65;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.core.default_owner, Some(Uuid::from_u128(42)));
        assert_eq!(loaded.dedup.min_similarity_score, 65);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.dedup.min_similarity_score, 50);
    }
}
