//! Runtime configuration settings

use crate::error::{EightcountError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Store file name inside the per-user data directory
const STORE_FILENAME: &str = "annotations.json";
/// Last-resort store location when no data directory is available
const FALLBACK_STORE: &str = "./eightcount.json";

/// Runtime settings resolved from the command line and environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Annotation store file
    pub store_path: PathBuf,
    /// Seed file for an empty store
    pub seed_path: Option<PathBuf>,
}

impl Settings {
    /// Create settings from CLI arguments
    ///
    /// `--store` (or `EIGHTCOUNT_STORE`, which clap folds into it) wins over
    /// the per-user data directory.
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let store_path = cli.store.clone().unwrap_or_else(default_store_path);

        Self {
            store_path,
            seed_path: cli.seed.clone(),
        }
    }

    /// Check that the store can be created where configured
    pub fn validate(&self) -> Result<()> {
        if self.store_path.is_dir() {
            return Err(EightcountError::ConfigError(format!(
                "Store path is a directory: {}\n  Tip: Point --store at a file, e.g. {}",
                self.store_path.display(),
                self.store_path.join(STORE_FILENAME).display()
            )));
        }

        if let Some(seed) = &self.seed_path {
            if !seed.is_file() {
                return Err(EightcountError::ConfigError(format!(
                    "Seed file does not exist: {}",
                    seed.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            seed_path: None,
        }
    }
}

/// Store location in the platform data directory
///
/// ~/.local/share/eightcount/annotations.json (Linux XDG)
/// or ~/Library/Application Support/com.eightcount.eightcount/ (macOS)
pub fn default_store_path() -> PathBuf {
    ProjectDirs::from("com", "eightcount", "eightcount")
        .map(|dirs| dirs.data_dir().join(STORE_FILENAME))
        .unwrap_or_else(|| Path::new(FALLBACK_STORE).to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_store_path_is_json_file() {
        let path = default_store_path();
        assert!(path.extension().is_some_and(|e| e == "json"));
    }

    #[test]
    fn test_validate_rejects_directory_store() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            store_path: dir.path().to_path_buf(),
            seed_path: None,
        };
        assert!(matches!(settings.validate(), Err(EightcountError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_missing_seed() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            store_path: dir.path().join("store.json"),
            seed_path: Some(dir.path().join("missing.json")),
        };
        assert!(settings.validate().is_err());
    }
}
