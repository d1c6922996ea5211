//! Configuration file loading.
//!
//! Reads `config.toml` from the client's config directory. A missing file
//! is not an error: the defaults point at a local backend. The backend
//! URL can be overridden with the `TUTORLINK_BACKEND_URL` environment
//! variable, which wins over the file.

use std::fs;
use std::path::PathBuf;
use tutorlink_core::config::ClientConfig;
use tutorlink_core::error::Result;

/// Environment variable overriding the configured backend URL.
pub const BACKEND_URL_ENV: &str = "TUTORLINK_BACKEND_URL";

/// Loads [`ClientConfig`] from a TOML file.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the configuration, applying the environment override.
    ///
    /// # Errors
    ///
    /// Returns an error only for an unreadable or unparseable file; a
    /// missing file yields the defaults.
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = self.load_file()?;
        apply_backend_override(&mut config, std::env::var(BACKEND_URL_ENV).ok());
        Ok(config)
    }

    fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigLoader] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config = toml::from_str(&content)?;
        tracing::debug!("[ConfigLoader] Loaded config from {}", self.path.display());
        Ok(config)
    }
}

fn apply_backend_override(config: &mut ClientConfig, backend_url: Option<String>) {
    if let Some(url) = backend_url {
        let url = url.trim();
        if !url.is_empty() {
            config.backend_url = url.trim_end_matches('/').to_string();
        }
    }
}
