//! Tutoring use case: learn requests, tutor offers, topics, proposals.

use anyhow::Result;
use tutorlink_api::ApiClient;
use tutorlink_core::session::SessionManager;
use tutorlink_core::tutoring::{
    LearnRequest, ProfileView, SessionProposal, TutorOffer, TUTOR_POINTS,
};
use tutorlink_core::TutorError;

/// Use case for the tutoring flows around the notification loop:
/// submitting learn requests and tutor offers, browsing requested topics,
/// and proposing sessions.
pub struct TutoringUseCase {
    api: ApiClient,
    sessions: SessionManager,
}

impl TutoringUseCase {
    pub fn new(api: ApiClient, sessions: SessionManager) -> Self {
        Self { api, sessions }
    }

    /// Submits a learn request for the logged-in user.
    pub async fn submit_learn_request(&self, topic: &str, file_name: &str) -> Result<()> {
        // 1. Validate locally
        let topic = topic.trim();
        let file_name = file_name.trim();
        if topic.is_empty() || file_name.is_empty() {
            return Err(TutorError::validation("Please enter a topic and choose a file.").into());
        }

        // 2. Stamp with the session username
        let session = self.sessions.require().await?;
        let request = LearnRequest {
            topic: topic.to_string(),
            file_name: file_name.to_string(),
            requested_by_username: session.username,
        };

        // 3. Submit
        self.api.submit_learn_request(&request).await?;
        tracing::info!("[Tutoring] Learn request submitted for topic '{}'", topic);
        Ok(())
    }

    /// Submits a tutor offer.
    pub async fn submit_tutor_offer(
        &self,
        name: &str,
        number: &str,
        schedule: &str,
    ) -> Result<()> {
        let name = name.trim();
        let number = number.trim();
        let schedule = schedule.trim();
        if name.is_empty() || number.is_empty() || schedule.is_empty() {
            return Err(
                TutorError::validation("Please fill Name, Number and Schedule & Timing.").into(),
            );
        }

        let offer = TutorOffer {
            name: name.to_string(),
            number: number.to_string(),
            schedule: schedule.to_string(),
        };
        self.api.submit_tutor_offer(&offer).await?;
        tracing::info!("[Tutoring] Tutor offer submitted by '{}'", name);
        Ok(())
    }

    /// All requested topics, for the tutor list view.
    pub async fn browse_topics(&self) -> Result<Vec<LearnRequest>> {
        Ok(self.api.list_learn_requests(None).await?)
    }

    /// Profile view data for the logged-in user.
    pub async fn profile(&self) -> Result<ProfileView> {
        let session = self.sessions.require().await?;
        let learn_requests = self
            .api
            .list_learn_requests(Some(&session.username))
            .await?;

        Ok(ProfileView {
            display_name: session.display_name,
            username: session.username,
            learn_requests,
            tutor_points: TUTOR_POINTS,
        })
    }

    /// Proposes a session to the student who requested `topic`.
    ///
    /// The call is awaited and its failure surfaced, so a proposal the
    /// backend never saw is not silently reported as sent.
    pub async fn propose_session(
        &self,
        recipient_username: &str,
        topic: &str,
        date: &str,
        time: &str,
    ) -> Result<()> {
        // 1. Validate locally
        let date = date.trim();
        let time = time.trim();
        if date.is_empty() || time.is_empty() {
            return Err(TutorError::validation("Please select both a date and a time.").into());
        }

        // 2. Stamp with the session username
        let session = self.sessions.require().await?;
        let proposal = SessionProposal {
            proposer_username: session.username,
            recipient_username: recipient_username.to_string(),
            topic: topic.to_string(),
            proposed_date: date.to_string(),
            proposed_time: time.to_string(),
        };

        // 3. Submit
        self.api.submit_proposal(&proposal).await?;
        tracing::info!(
            "[Tutoring] Proposed '{}' to {} on {} at {}",
            topic,
            recipient_username,
            date,
            time
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tutorlink_core::session::{MemorySessionStore, SessionContext};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn logged_in_usecase(server_uri: &str) -> TutoringUseCase {
        let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()));
        sessions
            .open(SessionContext::new("amy01", "Amy"))
            .await
            .unwrap();
        TutoringUseCase::new(ApiClient::new(server_uri), sessions)
    }

    #[tokio::test]
    async fn test_learn_request_stamped_with_username() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/learn"))
            .and(body_json(json!({
                "topic": "Algebra",
                "fileName": "notes.pdf",
                "requestedByUsername": "amy01"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tutoring = logged_in_usecase(&server.uri()).await;
        tutoring
            .submit_learn_request("Algebra", "notes.pdf")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_learn_request_requires_session() {
        let server = MockServer::start().await;
        let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()));
        let tutoring = TutoringUseCase::new(ApiClient::new(server.uri()), sessions);

        let err = tutoring
            .submit_learn_request("Algebra", "notes.pdf")
            .await
            .unwrap_err();
        let tutor_err = err.downcast_ref::<TutorError>().unwrap();
        assert!(tutor_err.is_no_session());
    }

    #[tokio::test]
    async fn test_learn_request_validates_fields() {
        let server = MockServer::start().await;
        let tutoring = logged_in_usecase(&server.uri()).await;

        let err = tutoring.submit_learn_request("", "notes.pdf").await.unwrap_err();
        assert!(err
            .downcast_ref::<TutorError>()
            .is_some_and(TutorError::is_validation));
    }

    #[tokio::test]
    async fn test_profile_lists_own_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/learn"))
            .and(query_param("username", "amy01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"topic": "Algebra", "fileName": "notes.pdf", "requestedByUsername": "amy01"}
            ])))
            .mount(&server)
            .await;

        let tutoring = logged_in_usecase(&server.uri()).await;
        let profile = tutoring.profile().await.unwrap();
        assert_eq!(profile.username, "amy01");
        assert_eq!(profile.learn_requests.len(), 1);
        assert_eq!(profile.tutor_points, TUTOR_POINTS);
    }

    #[tokio::test]
    async fn test_propose_session_requires_date_and_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proposals"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tutoring = logged_in_usecase(&server.uri()).await;
        let err = tutoring
            .propose_session("ben02", "Algebra", "", "10:00")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("date and a time"));
    }

    #[tokio::test]
    async fn test_propose_session_sends_full_proposal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proposals"))
            .and(body_json(json!({
                "proposerUsername": "amy01",
                "recipientUsername": "ben02",
                "topic": "Algebra",
                "proposedDate": "2024-01-01",
                "proposedTime": "10:00"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tutoring = logged_in_usecase(&server.uri()).await;
        tutoring
            .propose_session("ben02", "Algebra", "2024-01-01", "10:00")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_propose_session_surfaces_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proposals"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tutoring = logged_in_usecase(&server.uri()).await;
        let err = tutoring
            .propose_session("ben02", "Algebra", "2024-01-01", "10:00")
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<TutorError>().and_then(TutorError::status),
            Some(500)
        );
    }
}
