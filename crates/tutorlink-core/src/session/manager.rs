//! Active-session lifecycle management.

use super::model::SessionContext;
use super::repository::SessionStore;
use crate::error::{Result, TutorError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the active session and keeps it in sync with a [`SessionStore`].
///
/// `SessionManager` is responsible for:
/// - Opening a session at login and persisting it
/// - Restoring the last session on startup
/// - Closing the session at logout
/// - Answering "who is logged in?" for the rest of the client
///
/// # Thread Safety
///
/// The active context lives behind an `RwLock`; the manager is cheap to
/// clone and share across tasks.
#[derive(Clone)]
pub struct SessionManager {
    /// In-memory active session
    active: Arc<RwLock<Option<SessionContext>>>,
    /// Persistent storage backend for the session
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Creates a manager with no active session.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            active: Arc::new(RwLock::new(None)),
            store,
        }
    }

    /// Opens a session and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted; the in-memory
    /// session is still set in that case so the current run keeps working.
    pub async fn open(&self, context: SessionContext) -> Result<()> {
        {
            let mut active = self.active.write().await;
            *active = Some(context.clone());
        }
        self.store.save(&context).await
    }

    /// Attempts to restore the last persisted session on startup.
    ///
    /// # Returns
    ///
    /// `Some(context)` if a session was restored, `None` otherwise.
    pub async fn restore(&self) -> Result<Option<SessionContext>> {
        let restored = self.store.load().await?;
        if let Some(context) = &restored {
            let mut active = self.active.write().await;
            *active = Some(context.clone());
        }
        Ok(restored)
    }

    /// Closes the active session and clears the persisted one.
    pub async fn close(&self) -> Result<()> {
        {
            let mut active = self.active.write().await;
            *active = None;
        }
        self.store.clear().await
    }

    /// Returns the active session, if any.
    pub async fn current(&self) -> Option<SessionContext> {
        self.active.read().await.clone()
    }

    /// Returns the active username, if any.
    pub async fn username(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|s| s.username.clone())
    }

    /// Returns the active session or a `NoSession` error.
    pub async fn require(&self) -> Result<SessionContext> {
        self.current().await.ok_or(TutorError::NoSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::repository::MemorySessionStore;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_open_and_current() {
        let manager = manager();
        assert!(manager.current().await.is_none());

        manager.open(SessionContext::new("amy01", "Amy")).await.unwrap();
        assert_eq!(manager.username().await.as_deref(), Some("amy01"));
    }

    #[tokio::test]
    async fn test_close_clears_session() {
        let manager = manager();
        manager.open(SessionContext::new("amy01", "Amy")).await.unwrap();
        manager.close().await.unwrap();
        assert!(manager.current().await.is_none());
        assert!(manager.require().await.unwrap_err().is_no_session());
    }

    #[tokio::test]
    async fn test_restore_from_store() {
        let store = Arc::new(MemorySessionStore::new());
        let ctx = SessionContext::new("ben02", "Ben");
        store.save(&ctx).await.unwrap();

        let manager = SessionManager::new(store);
        let restored = manager.restore().await.unwrap();
        assert_eq!(restored, Some(ctx));
        assert_eq!(manager.username().await.as_deref(), Some("ben02"));
    }

    #[tokio::test]
    async fn test_restore_with_empty_store() {
        let manager = manager();
        assert!(manager.restore().await.unwrap().is_none());
        assert!(manager.current().await.is_none());
    }
}
