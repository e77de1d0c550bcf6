//! Unified error types for eightcount
//!
//! Error strategy:
//! - The beat engine never fails: undefined positions are values, not errors
//! - User errors (unknown song, bad reset value, bad track reference): report and exit 2
//! - System errors (store or export I/O, corrupt files): report and exit 1
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for eightcount operations
#[derive(Debug, Error)]
pub enum EightcountError {
    // =========================================================================
    // User errors - bad input, nothing was modified
    // =========================================================================
    #[error("Song not found: '{0}'\n  Tip: Run `eightcount song list` to see known songs (ids or Spotify ids both work)")]
    SongNotFound(String),

    #[error("Marker '{id}' not found on song '{song_id}'")]
    MarkerNotFound { song_id: String, id: String },

    #[error("Count change '{id}' not found on song '{song_id}'")]
    CountChangeNotFound { song_id: String, id: String },

    #[error("Invalid count reset value {0}\n  Counts run from 1 to 8")]
    InvalidResetTo(u8),

    #[error("Invalid tempo {0}\n  Tip: Use a BPM between 0 and 1000, where 0 clears the tempo")]
    InvalidBpm(f64),

    #[error("Cannot parse Spotify track reference '{0}'\n  Accepted forms:\n    spotify:track:<id>\n    https://open.spotify.com/track/<id>\n    <id>")]
    InvalidTrackRef(String),

    // =========================================================================
    // System errors - storage and interchange
    // =========================================================================
    #[error("Annotation store '{path}' is unusable: {reason}\n  Tip: Check the file is readable JSON, or point --store at another file")]
    StoreError { path: PathBuf, reason: String },

    #[error("Stored '{key}' has an unexpected shape, refusing to overwrite it: {reason}\n  Tip: Fix or remove that key in the store file")]
    UnreadableKey { key: String, reason: String },

    #[error("Cannot import '{path}': {reason}\n  Tip: Expected a {{\"song\", \"breakdown\"}} object or an array of them")]
    ImportError { path: PathBuf, reason: String },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for eightcount operations
pub type Result<T> = std::result::Result<T, EightcountError>;

impl EightcountError {
    /// Returns true if this error was caused by bad user input rather than the system
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EightcountError::SongNotFound(_)
                | EightcountError::MarkerNotFound { .. }
                | EightcountError::CountChangeNotFound { .. }
                | EightcountError::InvalidResetTo(_)
                | EightcountError::InvalidBpm(_)
                | EightcountError::InvalidTrackRef(_)
                | EightcountError::ConfigError(_)
        )
    }

    /// Create a store error from any displayable cause
    pub fn store_error(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        EightcountError::StoreError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        EightcountError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        assert!(EightcountError::SongNotFound("x".into()).is_user_error());
        assert!(EightcountError::InvalidResetTo(9).is_user_error());
        assert!(!EightcountError::store_error("/tmp/a.json", "bad").is_user_error());
        assert!(!EightcountError::UnreadableKey { key: "k".into(), reason: "bad".into() }.is_user_error());
    }

    #[test]
    fn test_output_error_reason_for_missing_dir() {
        let err = EightcountError::output_error(
            "/nonexistent/dir/out.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let msg = err.to_string();
        assert!(msg.contains("Directory does not exist"), "got: {}", msg);
        assert!(msg.contains("/nonexistent/dir"));
    }
}
