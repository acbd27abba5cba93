//! # Configuration Module
//!
//! Handles data directory setup and runtime configuration for Moodtune.
//! The catalog database lives in the platform-standard data directory:
//!
//! - Linux: `~/.local/share/moodtune/`
//! - macOS: `~/Library/Application Support/moodtune/`
//! - Windows: `%APPDATA%\moodtune\`
//!
//! The sentiment scorer command can be configured per invocation
//! (`--sentiment-cmd`) or through the `MOODTUNE_SENTIMENT_CMD` environment
//! variable.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Returns the platform-appropriate catalog database path, creating the
/// `moodtune` data subdirectory if needed.
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("catalog.db"))
}

/// Returns the platform-appropriate data directory for Moodtune.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!("Could not determine system data directory for this platform.")
    })?;

    let moodtune_dir = data_dir.join("moodtune");
    fs::create_dir_all(&moodtune_dir).with_context(|| {
        format!(
            "Failed to create Moodtune data directory at {}. Please check file permissions.",
            moodtune_dir.display()
        )
    })?;

    Ok(moodtune_dir)
}

/// Resolved runtime configuration for one invocation.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Path to the catalog database file.
    pub db_path: PathBuf,
}

impl RuntimeConfig {
    /// Resolve the database path from an explicit override or the platform
    /// default.
    pub fn resolve(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => get_db_path()?,
        };
        Ok(Self { db_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_lands_in_the_moodtune_directory() {
        let path = get_db_path().expect("should resolve");
        assert!(path.is_absolute());
        assert!(path.to_string_lossy().ends_with("catalog.db"));
        assert_eq!(path.parent().unwrap().file_name().unwrap(), "moodtune");
    }

    #[test]
    fn data_directory_is_created() {
        let dir = get_data_dir().expect("should resolve");
        assert!(dir.exists());
        assert!(dir.is_dir());
    }

    #[test]
    fn explicit_db_override_wins() {
        let config = RuntimeConfig::resolve(Some(PathBuf::from("/tmp/test-catalog.db")))
            .expect("should resolve");
        assert_eq!(config.db_path, PathBuf::from("/tmp/test-catalog.db"));
    }
}
