//! User-facing input models and their local validation.
//!
//! The original client rejected incomplete forms before any network call;
//! the same checks live here so every frontend gets them.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into().trim().to_string(),
        }
    }

    /// Both fields must be present.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(TutorError::validation(
                "Please enter your username and password.",
            ));
        }
        Ok(())
    }
}

/// Signup form details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupDetails {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupDetails {
    /// All four fields must be present.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.username.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.trim().is_empty()
        {
            return Err(TutorError::validation("Please fill in all signup details."));
        }
        Ok(())
    }
}

/// New-password submission for the reset flow.
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordReset {
    /// Token present, both passwords present, and matching.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(TutorError::validation(
                "No reset token provided. Please request a new link.",
            ));
        }
        if self.new_password.trim().is_empty() || self.confirm_password.trim().is_empty() {
            return Err(TutorError::validation(
                "Please enter and confirm your new password.",
            ));
        }
        if self.new_password != self.confirm_password {
            return Err(TutorError::validation("Passwords do not match."));
        }
        Ok(())
    }
}
