pub mod dialog;
pub mod model;
pub mod sink;

pub use dialog::{DialogGate, DialogState};
pub use model::{
    Notification, ProposalDecision, ProposalNotification, ProposalStatusNotification,
};
pub use sink::NotificationSink;
