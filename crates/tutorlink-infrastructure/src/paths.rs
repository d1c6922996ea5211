//! Path resolution for client-side files.
//!
//! Everything the client writes lives under `~/.config/tutorlink/`.

use std::path::{Path, PathBuf};
use tutorlink_core::error::{Result, TutorError};

const APP_DIR: &str = "tutorlink";
const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.toml";

/// Resolves the locations of the client's files.
#[derive(Debug, Clone)]
pub struct TutorlinkPaths {
    root: PathBuf,
}

impl TutorlinkPaths {
    /// Creates paths rooted at the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the platform config directory cannot
    /// be determined (no home directory).
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TutorError::config("Could not determine config directory"))?;
        Ok(Self {
            root: config_dir.join(APP_DIR),
        })
    }

    /// Creates paths rooted at an explicit directory (for testing).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The client's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path of the persisted session file.
    pub fn session_file(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_layout() {
        let paths = TutorlinkPaths::with_root("/tmp/tutorlink-test");
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/tutorlink-test/config.toml")
        );
        assert_eq!(
            paths.session_file(),
            PathBuf::from("/tmp/tutorlink-test/session.toml")
        );
    }
}
