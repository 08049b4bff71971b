//! Real-time push channel seam.
//!
//! The hub hands every stored notification to a `PushChannel`. Delivery is
//! at-most-once: a failed publish is logged by the hub and otherwise ignored.

use crate::orm::notifications;
use serde::Serialize;

/// Payload forwarded to connected clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationData {
    pub id: i32,
    pub notification_type: String,
    pub actor_id: Option<i32>,
    pub actor_username: Option<String>,
    pub post_id: Option<i32>,
    pub comment_text: Option<String>,
    pub message: Option<String>,
    pub created_at: String,
}

impl From<&notifications::Model> for NotificationData {
    fn from(n: &notifications::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.type_.as_str().to_string(),
            actor_id: n.actor_id,
            actor_username: n.actor_username.clone(),
            post_id: n.post_id,
            comment_text: n.comment_text.clone(),
            message: n.message.clone(),
            created_at: n.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// Push delivery errors.
#[derive(Debug)]
pub enum PushError {
    /// Channel is saturated and dropped the message
    Full,
    /// Channel is no longer running
    Closed,
    /// Transport-specific failure
    Transport(String),
}

impl std::fmt::Display for PushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::Full => write!(f, "Push channel full"),
            PushError::Closed => write!(f, "Push channel closed"),
            PushError::Transport(msg) => write!(f, "Push transport error: {}", msg),
        }
    }
}

impl std::error::Error for PushError {}

/// Fire-and-forget publisher keyed by recipient user id.
pub trait PushChannel: Send + Sync {
    fn publish(&self, recipient_user_id: i32, payload: NotificationData) -> Result<(), PushError>;
}

/// Channel used when no real-time transport is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl PushChannel for Discard {
    fn publish(&self, _: i32, _: NotificationData) -> Result<(), PushError> {
        Ok(())
    }
}
