pub mod auth;
pub mod notifier;
pub mod tutoring;

pub use auth::AuthUseCase;
pub use notifier::{NotificationService, PollHandle, PollStatsSnapshot};
pub use tutoring::TutoringUseCase;
