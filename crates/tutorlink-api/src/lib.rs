pub mod client;
pub mod push;

pub use client::{ApiClient, LoginUser};
pub use push::{ChannelState, PushSubscription};
