//! Tutoring domain models: learn requests, tutor offers, proposals.

use serde::{Deserialize, Serialize};

/// Tutor points shown on the profile view. The backend does not expose a
/// points endpoint; the value is a fixed display constant.
pub const TUTOR_POINTS: u32 = 10;

/// A topic a user wants to be tutored on, with the supporting file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnRequest {
    pub topic: String,
    pub file_name: String,
    #[serde(default)]
    pub requested_by_username: String,
}

/// A user's offer to tutor, with contact and schedule details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorOffer {
    pub name: String,
    pub number: String,
    pub schedule: String,
}

/// A concrete session offer for a requested topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    pub proposer_username: String,
    pub recipient_username: String,
    pub topic: String,
    pub proposed_date: String,
    pub proposed_time: String,
}

/// Data backing the profile view: the user's own learn requests plus the
/// fixed tutor-points value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub display_name: String,
    pub username: String,
    pub learn_requests: Vec<LearnRequest>,
    pub tutor_points: u32,
}
