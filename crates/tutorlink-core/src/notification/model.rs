//! Notification payloads reported by the backend.
//!
//! Wire field names are camelCase (the backend is the authority on the
//! format); both notification endpoints return either a tagged object or
//! `null` when there is nothing new.

use serde::{Deserialize, Serialize};

/// Server-reported events for the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// A tutor proposed a session to the user.
    NewProposal { data: ProposalNotification },
    /// A proposal the user sent earlier was accepted or rejected.
    ProposalResponse { data: ProposalStatusNotification },
}

/// Payload of a new-proposal notification.
///
/// Ephemeral: exists only as the payload of one poll response or push
/// message, never persisted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalNotification {
    pub id: String,
    pub tutor_name: String,
    pub tutor_points: u32,
    pub topic: String,
    pub date: String,
    pub time: String,
}

/// Payload of a proposal-response notification. Display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalStatusNotification {
    pub topic: String,
    pub status: String,
    pub recipient: String,
}

/// The user's decision on a received proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalDecision {
    Accepted,
    Rejected,
}

impl ProposalDecision {
    /// The wire string the respond endpoint expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalDecision::Accepted => "accepted",
            ProposalDecision::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProposalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
