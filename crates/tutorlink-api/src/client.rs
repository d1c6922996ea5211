//! HTTP client for the TutorLink backend.
//!
//! One method per backend endpoint, typed request/response DTOs private
//! to this module, and a single status-mapping helper. The backend keys
//! everything by username; there is no token scheme on these calls.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tutorlink_core::error::{Result, TutorError};
use tutorlink_core::notification::{Notification, ProposalDecision};
use tutorlink_core::tutoring::{LearnRequest, SessionProposal, TutorOffer};
use tutorlink_core::user::{Credentials, SignupDetails};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the TutorLink HTTP API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-request timeout after construction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The backend base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============================================================================
    // Auth
    // ============================================================================

    /// Authenticates and returns the backend's user record.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginUser> {
        let url = format!("{}/api/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(credentials)
            .timeout(self.timeout)
            .send()
            .await?;

        let parsed: LoginResponse = Self::read_json(response).await?;
        Ok(parsed.user)
    }

    /// Registers a new account. Returns the backend's confirmation message.
    pub async fn signup(&self, details: &SignupDetails) -> Result<String> {
        let url = format!("{}/api/signup", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(details)
            .timeout(self.timeout)
            .send()
            .await?;

        let parsed: MessageResponse = Self::read_json(response).await?;
        Ok(parsed.message)
    }

    /// Requests a password reset link for `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        let url = format!("{}/api/forgot-password", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .timeout(self.timeout)
            .send()
            .await?;

        let parsed: MessageResponse = Self::read_json(response).await?;
        Ok(parsed.message)
    }

    /// Submits a new password for the given reset token.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<String> {
        let url = format!("{}/api/reset-password", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ResetPasswordRequest {
                token: token.to_string(),
                password: password.to_string(),
            })
            .timeout(self.timeout)
            .send()
            .await?;

        let parsed: MessageResponse = Self::read_json(response).await?;
        Ok(parsed.message)
    }

    // ============================================================================
    // Learn requests and tutor offers
    // ============================================================================

    /// Submits a learn request.
    pub async fn submit_learn_request(&self, request: &LearnRequest) -> Result<()> {
        let url = format!("{}/api/learn", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Lists learn requests; with `username`, only that user's requests.
    pub async fn list_learn_requests(&self, username: Option<&str>) -> Result<Vec<LearnRequest>> {
        let url = format!("{}/api/learn", self.base_url);
        let mut request = self.client.get(&url).timeout(self.timeout);
        if let Some(username) = username {
            request = request.query(&[("username", username)]);
        }
        let response = request.send().await?;

        Self::read_json(response).await
    }

    /// Submits a tutor offer.
    pub async fn submit_tutor_offer(&self, offer: &TutorOffer) -> Result<()> {
        let url = format!("{}/api/tutor", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(offer)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ============================================================================
    // Proposals and notifications
    // ============================================================================

    /// Sends a session proposal to the student who requested the topic.
    pub async fn submit_proposal(&self, proposal: &SessionProposal) -> Result<()> {
        let url = format!("{}/api/proposals", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(proposal)
            .timeout(self.timeout)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Reads the pending notification for `username`, if any.
    pub async fn fetch_notification(&self, username: &str) -> Result<Option<Notification>> {
        let url = format!("{}/api/notifications/{}", self.base_url, username);
        self.fetch_optional_notification(&url).await
    }

    /// Reads the pending proposal-status notification for `username`, if any.
    pub async fn fetch_proposal_status(&self, username: &str) -> Result<Option<Notification>> {
        let url = format!("{}/api/proposal-status/{}", self.base_url, username);
        self.fetch_optional_notification(&url).await
    }

    /// Relays the user's decision on a proposal.
    pub async fn respond_to_proposal(
        &self,
        proposal_id: &str,
        decision: ProposalDecision,
    ) -> Result<()> {
        let url = format!("{}/api/proposals/{}/respond", self.base_url, proposal_id);
        let response = self
            .client
            .post(&url)
            .json(&RespondRequest { response: decision })
            .timeout(self.timeout)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Obtains the push-channel URL for `username`.
    pub async fn negotiate(&self, username: &str) -> Result<String> {
        let url = format!("{}/negotiate", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("username", username)])
            .timeout(self.timeout)
            .send()
            .await?;

        let parsed: NegotiateResponse = Self::read_json(response).await?;
        Ok(parsed.url)
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn fetch_optional_notification(&self, url: &str) -> Result<Option<Notification>> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(Self::map_http_error(response).await);
        }

        // The endpoint reports either a tagged notification or `null`.
        // A body carrying some other shape holds no event for this
        // client and is treated the same as `null`.
        let value: serde_json::Value = response.json().await?;
        if value.is_null() {
            return Ok(None);
        }
        match serde_json::from_value::<Notification>(value) {
            Ok(notification) => Ok(Some(notification)),
            Err(err) => {
                tracing::debug!("[ApiClient] Ignoring unrecognized notification body: {err}");
                Ok(None)
            }
        }
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::map_http_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::map_http_error(response).await);
        }
        Ok(())
    }

    async fn map_http_error(response: reqwest::Response) -> TutorError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        let message = serde_json::from_str::<MessageResponse>(&body)
            .map(|wrapper| wrapper.message)
            .unwrap_or_else(|_| default_status_message(status, &body));

        TutorError::api(status.as_u16(), message)
    }
}

fn default_status_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// User record in a successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub name: String,
    pub username: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: LoginUser,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Serialize)]
struct ResetPasswordRequest {
    token: String,
    password: String,
}

#[derive(Serialize)]
struct RespondRequest {
    response: ProposalDecision,
}

#[derive(Deserialize)]
struct NegotiateResponse {
    url: String,
}
