//! Presentation seam for notifications.

use super::model::{ProposalNotification, ProposalStatusNotification};

/// Receives notification events for display.
///
/// This trait is the only thing the notification service knows about
/// presentation. The CLI backs it with a channel into its REPL loop;
/// tests back it with a recording sink.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// A new proposal passed the dialog gate and should be shown.
    async fn proposal_received(&self, proposal: ProposalNotification);

    /// A proposal the user sent was answered. One-shot message, no state.
    async fn proposal_status_changed(&self, status: ProposalStatusNotification);
}
