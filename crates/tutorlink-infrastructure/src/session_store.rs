//! File-backed session persistence.
//!
//! Stores the active session as `session.toml` so a restarted client can
//! pick up where the user left off. Writes go through a temp file and an
//! atomic rename; a crash mid-write leaves either the old session or the
//! new one, never a torn file.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;
use tutorlink_core::error::Result;
use tutorlink_core::session::{SessionContext, SessionStore};

/// [`SessionStore`] implementation backed by a TOML file.
pub struct TomlSessionStore {
    path: PathBuf,
}

impl TomlSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_session(&self) -> Result<Option<SessionContext>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let session: SessionContext = toml::from_str(&content)?;
        Ok(Some(session))
    }

    fn write_session(&self, session: &SessionContext) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(session)?;

        // Write to a temp file in the same directory, then rename over
        // the target.
        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn remove_session(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "session.toml".to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

#[async_trait::async_trait]
impl SessionStore for TomlSessionStore {
    async fn load(&self) -> Result<Option<SessionContext>> {
        self.read_session()
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        tracing::debug!(
            "[SessionStore] Persisting session for {} to {}",
            session.username,
            self.path.display()
        );
        self.write_session(session)
    }

    async fn clear(&self) -> Result<()> {
        tracing::debug!("[SessionStore] Clearing {}", self.path.display());
        self.remove_session()
    }
}
