//! Push-based notification transport.
//!
//! Alternative to polling: the backend's `/negotiate` endpoint hands out
//! a channel URL for the user, and a websocket subscription to that URL
//! yields the same two notification kinds as the poll endpoints, one
//! JSON frame per event. The broker itself is an external managed
//! service; this module only consumes it.

use crate::client::ApiClient;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tutorlink_core::error::{Result, TutorError};
use tutorlink_core::notification::Notification;
use uuid::Uuid;

/// Connection state reported by [`PushSubscription::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Subscription task is reading frames
    Connected,
    /// Subscription ended (server close, connection loss, or `close()`)
    Closed,
}

/// An open push subscription for one user.
///
/// Inbound frames are decoded and forwarded over an internal channel;
/// they are processed one at a time, so notification handling never
/// overlaps. Dropping the subscription (or calling [`close`]) ends the
/// read task.
///
/// [`close`]: PushSubscription::close
pub struct PushSubscription {
    connection_id: String,
    receiver: mpsc::Receiver<Notification>,
    task: JoinHandle<()>,
}

impl PushSubscription {
    /// Negotiates a channel URL for `username` and connects to it.
    ///
    /// # Errors
    ///
    /// Returns an error if negotiation fails or the websocket connection
    /// cannot be established. Once connected, connection loss is not an
    /// error: the stream of notifications simply ends.
    pub async fn open(api: &ApiClient, username: &str) -> Result<Self> {
        // 1. Ask the backend where this user's channel lives
        let channel_url = api.negotiate(username).await?;
        let connection_id = Uuid::new_v4().to_string();

        tracing::info!(
            "[PushChannel] Negotiated channel for {} (connection {})",
            username,
            connection_id
        );

        // 2. Connect and spawn the read loop
        let (stream, _response) = connect_async(&channel_url)
            .await
            .map_err(|err| TutorError::transport(format!("websocket connect failed: {err}")))?;

        let (tx, receiver) = mpsc::channel(16);
        let task_connection_id = connection_id.clone();
        let task = tokio::spawn(async move {
            let (_write, mut read) = stream.split();

            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if let Some(notification) = decode_frame(&text) {
                            if tx.send(notification).await.is_err() {
                                // Receiver dropped; nobody is listening.
                                break;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!(
                            "[PushChannel] Server closed connection {}",
                            task_connection_id
                        );
                        break;
                    }
                    Ok(_) => {
                        // Ping/pong/binary frames carry no notifications.
                    }
                    Err(err) => {
                        tracing::warn!(
                            "[PushChannel] Connection {} lost: {}",
                            task_connection_id,
                            err
                        );
                        break;
                    }
                }
            }

            tracing::debug!("[PushChannel] Read loop ended for {}", task_connection_id);
        });

        Ok(Self {
            connection_id,
            receiver,
            task,
        })
    }

    /// Receives the next notification, or `None` once the channel ends.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }

    /// Identifier for this connection, for log correlation.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Current channel state.
    pub fn state(&self) -> ChannelState {
        if self.task.is_finished() {
            ChannelState::Closed
        } else {
            ChannelState::Connected
        }
    }

    /// Ends the subscription.
    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Decodes one inbound frame into a notification.
///
/// Frames that are not one of the two known notification kinds are
/// dropped, matching the poll transport's handling of unrecognized
/// bodies.
fn decode_frame(text: &str) -> Option<Notification> {
    match serde_json::from_str::<Notification>(text) {
        Ok(notification) => Some(notification),
        Err(err) => {
            tracing::debug!("[PushChannel] Ignoring unrecognized frame: {err}");
            None
        }
    }
}
