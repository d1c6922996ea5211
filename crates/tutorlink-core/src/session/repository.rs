//! Persistence seam for the session context.

use super::model::SessionContext;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage backend for the active session.
///
/// The infrastructure layer provides a file-backed implementation;
/// [`MemorySessionStore`] backs tests and ephemeral sessions.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the persisted session, if one exists.
    async fn load(&self) -> Result<Option<SessionContext>>;

    /// Persists the given session, replacing any previous one.
    async fn save(&self, session: &SessionContext) -> Result<()>;

    /// Removes the persisted session.
    async fn clear(&self) -> Result<()>;
}

/// In-memory store. Nothing survives the process.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Arc<Mutex<Option<SessionContext>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionContext>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert!(store.load().await.unwrap().is_none());

        let ctx = SessionContext::new("amy01", "Amy");
        store.save(&ctx).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(ctx));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
