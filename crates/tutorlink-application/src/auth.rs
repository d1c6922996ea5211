//! Authentication use case.
//!
//! Orchestrates login, signup, logout, session restore, and the password
//! reset flow. Local field validation happens before any network call,
//! mirroring the form checks the web client performed; backend failures
//! carry the server's message for display.

use anyhow::Result;
use tutorlink_api::ApiClient;
use tutorlink_core::session::{SessionContext, SessionManager};
use tutorlink_core::user::{Credentials, PasswordReset, SignupDetails};
use tutorlink_core::TutorError;

/// Use case for account and session operations.
pub struct AuthUseCase {
    api: ApiClient,
    sessions: SessionManager,
}

impl AuthUseCase {
    pub fn new(api: ApiClient, sessions: SessionManager) -> Self {
        Self { api, sessions }
    }

    /// Logs in and opens a session.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty fields (no network call), or
    /// the backend's error for bad credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionContext> {
        // 1. Validate locally
        let credentials = Credentials::new(username, password);
        credentials.validate()?;

        // 2. Authenticate against the backend
        let user = self.api.login(&credentials).await?;
        tracing::info!("[Auth] Logged in as {}", user.username);

        // 3. Open and persist the session
        let context = SessionContext::new(user.username, user.name);
        if let Err(err) = self.sessions.open(context.clone()).await {
            // The login itself succeeded; a failed persist only costs
            // restore-on-restart.
            tracing::warn!("[Auth] Failed to persist session: {}", err);
        }

        Ok(context)
    }

    /// Registers a new account. Returns the backend's confirmation message.
    pub async fn signup(&self, details: SignupDetails) -> Result<String> {
        details.validate()?;

        let message = self.api.signup(&details).await?;
        tracing::info!("[Auth] Signup completed for {}", details.username);
        Ok(message)
    }

    /// Closes the active session and clears the persisted one.
    pub async fn logout(&self) -> Result<()> {
        self.sessions.close().await?;
        tracing::info!("[Auth] Logged out");
        Ok(())
    }

    /// Restores the last persisted session, if any.
    pub async fn restore(&self) -> Result<Option<SessionContext>> {
        let restored = self.sessions.restore().await?;
        if let Some(context) = &restored {
            tracing::info!("[Auth] Restored session for {}", context.username);
        }
        Ok(restored)
    }

    /// Requests a password reset link for `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        let email = email.trim();
        if email.is_empty() {
            return Err(TutorError::validation("Please enter your registered email.").into());
        }

        let message = self.api.request_password_reset(email).await?;
        Ok(message)
    }

    /// Submits a new password for a reset token.
    pub async fn reset_password(&self, reset: PasswordReset) -> Result<String> {
        reset.validate()?;

        let message = self
            .api
            .reset_password(&reset.token, &reset.new_password)
            .await?;
        tracing::info!("[Auth] Password reset submitted");
        Ok(message)
    }
}
