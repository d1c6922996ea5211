//! Notification service: the poll scheduler and the proposal dialog flow.
//!
//! Detects new proposals and proposal-status changes for the logged-in
//! user and surfaces them through a [`NotificationSink`], then relays the
//! user's accept/reject decision back to the backend.
//!
//! Two transports feed the same dispatch path: the fixed-interval poll
//! loop started by [`NotificationService::start`], and push messages
//! handed in through [`NotificationService::dispatch`]. Poll failures are
//! logged and counted, never propagated; a cycle's failure leaves the
//! next scheduled cycle unaffected. There is no backoff, no retry
//! budget, and no circuit breaker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tutorlink_api::ApiClient;
use tutorlink_core::error::Result;
use tutorlink_core::notification::{
    DialogGate, Notification, NotificationSink, ProposalDecision, ProposalNotification,
    ProposalStatusNotification,
};
use tutorlink_core::session::SessionManager;

/// Counters exposed by the notification service.
///
/// All counters are monotonic for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStatsSnapshot {
    /// Cycles that ran both reads
    pub cycles: u64,
    /// Cycles skipped because nobody is logged in
    pub skipped_no_session: u64,
    /// Ticks skipped because the previous cycle was still in flight
    pub skipped_in_flight: u64,
    /// Successful notification reads
    pub successes: u64,
    /// Failed notification reads
    pub failures: u64,
}

#[derive(Default)]
struct PollStats {
    cycles: AtomicU64,
    skipped_no_session: AtomicU64,
    skipped_in_flight: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl PollStats {
    fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            skipped_no_session: self.skipped_no_session.load(Ordering::Relaxed),
            skipped_in_flight: self.skipped_in_flight.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a running poll loop.
///
/// The loop runs until [`stop`](PollHandle::stop) is called or the handle
/// is dropped.
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the poll loop and waits for it to finish.
    pub async fn stop(mut self) {
        self.token.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Detects and dispatches notifications for the logged-in user.
pub struct NotificationService {
    api: ApiClient,
    sessions: SessionManager,
    sink: Arc<dyn NotificationSink>,
    gate: DialogGate,
    in_flight: AtomicBool,
    poller_running: AtomicBool,
    stats: PollStats,
}

impl NotificationService {
    /// Creates a service bound to the given session context source and
    /// presentation sink.
    pub fn new(
        api: ApiClient,
        sessions: SessionManager,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            sessions,
            sink,
            gate: DialogGate::new(),
            in_flight: AtomicBool::new(false),
            poller_running: AtomicBool::new(false),
            stats: PollStats::default(),
        })
    }

    /// Starts the repeating poll task.
    ///
    /// Returns `None` if a poll loop for this service is already running.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between poll cycles (the web client used 5 s)
    pub fn start(self: &Arc<Self>, interval: Duration) -> Option<PollHandle> {
        if self.poller_running.swap(true, Ordering::SeqCst) {
            tracing::warn!("[Notifier] Poll loop already running, not starting another");
            return None;
        }

        let service = Arc::clone(self);
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            tracing::info!(target: "notify_poll", "Poll loop started ({:?} interval)", interval);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        service.poll_once().await;
                    }
                }
            }

            service.poller_running.store(false, Ordering::SeqCst);
            tracing::info!(target: "notify_poll", "Poll loop stopped");
        });

        Some(PollHandle { token, task })
    }

    /// Runs a single poll cycle.
    ///
    /// A no-op when nobody is logged in (performs no network call) or
    /// when the previous cycle is still in flight. Otherwise issues the
    /// two reads sequentially; each read's failure is logged and counted
    /// without affecting the other read or the next cycle.
    pub async fn poll_once(&self) {
        // No session, no poll.
        let Some(username) = self.sessions.username().await else {
            self.stats.skipped_no_session.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "notify_poll", "Tick skipped - not logged in");
            return;
        };

        // A slow previous cycle must not stack requests.
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.stats.skipped_in_flight.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "notify_poll", "Tick skipped - previous cycle still in flight");
            return;
        }

        self.stats.cycles.fetch_add(1, Ordering::Relaxed);

        match self.api.fetch_notification(&username).await {
            Ok(notification) => {
                self.stats.successes.fetch_add(1, Ordering::Relaxed);
                if let Some(notification) = notification {
                    self.dispatch(notification).await;
                }
            }
            Err(err) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "notify_poll", "Polling for new proposals failed: {}", err);
            }
        }

        match self.api.fetch_proposal_status(&username).await {
            Ok(notification) => {
                self.stats.successes.fetch_add(1, Ordering::Relaxed);
                if let Some(notification) = notification {
                    self.dispatch(notification).await;
                }
            }
            Err(err) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "notify_poll", "Polling for proposal status failed: {}", err);
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// Dispatches one notification, from either transport.
    pub async fn dispatch(&self, notification: Notification) {
        match notification {
            Notification::NewProposal { data } => self.on_new_proposal(data).await,
            Notification::ProposalResponse { data } => {
                self.on_proposal_status_changed(data).await
            }
        }
    }

    /// Resolves the shown dialog with the user's decision and relays it.
    ///
    /// Returns `Ok(Some(proposal))` when a dialog was resolved and the
    /// decision delivered, `Ok(None)` when no dialog was shown (a repeat
    /// resolve is a no-op with no second respond call).
    ///
    /// # Errors
    ///
    /// Returns the delivery error when the respond call fails; the dialog
    /// is already resolved at that point and is not re-shown.
    pub async fn resolve_dialog(
        &self,
        decision: ProposalDecision,
    ) -> Result<Option<ProposalNotification>> {
        let Some(proposal) = self.gate.resolve() else {
            return Ok(None);
        };

        self.respond(&proposal.id, decision).await?;
        Ok(Some(proposal))
    }

    /// Dismisses the shown dialog without responding (the overlay-click
    /// path). Returns the dismissed proposal, if one was shown.
    pub fn dismiss_dialog(&self) -> Option<ProposalNotification> {
        let dismissed = self.gate.resolve();
        if let Some(proposal) = &dismissed {
            tracing::debug!("[Notifier] Dismissed proposal {} without responding", proposal.id);
        }
        dismissed
    }

    /// Sends the user's decision for a proposal to the backend.
    ///
    /// Awaited: a delivery failure is returned to the caller instead of
    /// being dropped on the floor.
    pub async fn respond(&self, proposal_id: &str, decision: ProposalDecision) -> Result<()> {
        self.api.respond_to_proposal(proposal_id, decision).await?;
        tracing::info!("[Notifier] Proposal {} {}", proposal_id, decision);
        Ok(())
    }

    /// The proposal currently on display, if any.
    pub fn current_dialog(&self) -> Option<ProposalNotification> {
        self.gate.current()
    }

    /// Current counter values.
    pub fn stats(&self) -> PollStatsSnapshot {
        self.stats.snapshot()
    }

    async fn on_new_proposal(&self, data: ProposalNotification) {
        // Only one dialog at a time; a proposal arriving while one is
        // shown is dropped, so repeated polls of the same pending
        // proposal surface it once.
        if self.gate.try_show(data.clone()) {
            self.sink.proposal_received(data).await;
        } else {
            tracing::debug!(
                "[Notifier] Dialog already shown, dropping proposal {}",
                data.id
            );
        }
    }

    async fn on_proposal_status_changed(&self, data: ProposalStatusNotification) {
        // One-shot message; no dialog state retained.
        self.sink.proposal_status_changed(data).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use tutorlink_core::session::{MemorySessionStore, SessionContext};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Sink that records every event it receives.
    #[derive(Default)]
    struct RecordingSink {
        proposals: Mutex<Vec<ProposalNotification>>,
        statuses: Mutex<Vec<ProposalStatusNotification>>,
    }

    impl RecordingSink {
        fn proposal_count(&self) -> usize {
            self.proposals.lock().unwrap().len()
        }

        fn status_count(&self) -> usize {
            self.statuses.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl NotificationSink for RecordingSink {
        async fn proposal_received(&self, proposal: ProposalNotification) {
            self.proposals.lock().unwrap().push(proposal);
        }

        async fn proposal_status_changed(&self, status: ProposalStatusNotification) {
            self.statuses.lock().unwrap().push(status);
        }
    }

    async fn service_for(
        server: &MockServer,
        logged_in: bool,
    ) -> (Arc<NotificationService>, Arc<RecordingSink>) {
        let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()));
        if logged_in {
            sessions
                .open(SessionContext::new("ben02", "Ben"))
                .await
                .unwrap();
        }
        let sink = Arc::new(RecordingSink::default());
        let service = NotificationService::new(
            ApiClient::new(server.uri()),
            sessions,
            sink.clone() as Arc<dyn NotificationSink>,
        );
        (service, sink)
    }

    fn proposal_body() -> serde_json::Value {
        json!({
            "type": "newProposal",
            "data": {
                "id": "p1",
                "tutorName": "Amy",
                "tutorPoints": 10,
                "topic": "Algebra",
                "date": "2024-01-01",
                "time": "10:00"
            }
        })
    }

    async fn mount_null_endpoints(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/notifications/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proposal-status/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_no_session_performs_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(0)
            .mount(&server)
            .await;

        let (service, sink) = service_for(&server, false).await;
        service.poll_once().await;

        assert_eq!(service.stats().skipped_no_session, 1);
        assert_eq!(service.stats().cycles, 0);
        assert_eq!(sink.proposal_count(), 0);
    }

    #[tokio::test]
    async fn test_null_responses_produce_no_events() {
        let server = MockServer::start().await;
        mount_null_endpoints(&server).await;

        let (service, sink) = service_for(&server, true).await;
        service.poll_once().await;

        let stats = service.stats();
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.successes, 2);
        assert_eq!(stats.failures, 0);
        assert_eq!(sink.proposal_count(), 0);
        assert_eq!(sink.status_count(), 0);
    }

    #[tokio::test]
    async fn test_new_proposal_shows_dialog_and_accept_responds_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(proposal_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proposal-status/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/proposals/p1/respond"))
            .and(body_json(json!({"response": "accepted"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (service, sink) = service_for(&server, true).await;
        service.poll_once().await;

        // The dialog shows the five proposal fields.
        assert_eq!(sink.proposal_count(), 1);
        let shown = service.current_dialog().unwrap();
        assert_eq!(shown.id, "p1");
        assert_eq!(shown.tutor_name, "Amy");
        assert_eq!(shown.tutor_points, 10);
        assert_eq!(shown.topic, "Algebra");
        assert_eq!(shown.date, "2024-01-01");
        assert_eq!(shown.time, "10:00");

        // Accepting resolves the dialog and issues exactly one respond.
        let resolved = service
            .resolve_dialog(ProposalDecision::Accepted)
            .await
            .unwrap();
        assert_eq!(resolved.unwrap().id, "p1");
        assert!(service.current_dialog().is_none());

        // A second resolve is a no-op: no dialog, no second respond call.
        let repeat = service
            .resolve_dialog(ProposalDecision::Accepted)
            .await
            .unwrap();
        assert!(repeat.is_none());
    }

    #[tokio::test]
    async fn test_repeated_proposal_is_shown_only_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(proposal_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proposal-status/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .mount(&server)
            .await;

        let (service, sink) = service_for(&server, true).await;

        // The backend keeps reporting the same pending proposal until a
        // decision is made.
        service.poll_once().await;
        service.poll_once().await;

        assert_eq!(sink.proposal_count(), 1);
        assert_eq!(service.stats().cycles, 2);
    }

    #[tokio::test]
    async fn test_failed_notifications_read_still_checks_proposal_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/ben02"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proposal-status/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "proposalResponse",
                "data": {"topic": "Algebra", "status": "accepted", "recipient": "ben02"}
            })))
            .mount(&server)
            .await;

        let (service, sink) = service_for(&server, true).await;
        service.poll_once().await;

        let stats = service.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.successes, 1);
        assert_eq!(sink.status_count(), 1);
        assert_eq!(
            sink.statuses.lock().unwrap()[0].status,
            "accepted"
        );
    }

    #[tokio::test]
    async fn test_overlapping_cycles_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/notifications/ben02"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(null))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/proposal-status/ben02"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .mount(&server)
            .await;

        let (service, _sink) = service_for(&server, true).await;

        // Two ticks landing together: the second sees the first still in
        // flight and skips.
        tokio::join!(service.poll_once(), service.poll_once());

        let stats = service.stats();
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.skipped_in_flight, 1);
    }

    #[tokio::test]
    async fn test_dismiss_does_not_respond() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proposals/p1/respond"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (service, _sink) = service_for(&server, true).await;
        service
            .dispatch(serde_json::from_value(proposal_body()).unwrap())
            .await;

        let dismissed = service.dismiss_dialog().unwrap();
        assert_eq!(dismissed.id, "p1");
        assert!(service.current_dialog().is_none());
    }

    #[tokio::test]
    async fn test_push_dispatch_reaches_sink() {
        let server = MockServer::start().await;
        let (service, sink) = service_for(&server, true).await;

        service
            .dispatch(Notification::ProposalResponse {
                data: ProposalStatusNotification {
                    topic: "Algebra".to_string(),
                    status: "rejected".to_string(),
                    recipient: "ben02".to_string(),
                },
            })
            .await;

        assert_eq!(sink.status_count(), 1);
    }

    #[tokio::test]
    async fn test_poll_loop_runs_and_stops() {
        let server = MockServer::start().await;
        mount_null_endpoints(&server).await;

        let (service, _sink) = service_for(&server, true).await;
        let handle = service.start(Duration::from_millis(10)).unwrap();

        // A second start while the loop runs is refused.
        assert!(service.start(Duration::from_millis(10)).is_none());

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        let stats = service.stats();
        assert!(stats.cycles >= 2, "expected several cycles, got {stats:?}");

        // Stopped: the loop can be started again.
        assert!(service.start(Duration::from_millis(10)).is_some());
    }

    #[tokio::test]
    async fn test_failed_respond_surfaces_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/proposals/p1/respond"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (service, _sink) = service_for(&server, true).await;
        service
            .dispatch(serde_json::from_value(proposal_body()).unwrap())
            .await;

        let err = service
            .resolve_dialog(ProposalDecision::Rejected)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));

        // The dialog is spent even though delivery failed.
        assert!(service.current_dialog().is_none());
    }
}
