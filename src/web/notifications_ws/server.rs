//! Push server actor
//!
//! Tracks live WebSocket sessions per user and forwards published
//! notifications to all of them. Users without a live session simply miss
//! the push; the stored notification is still listed later.

use super::message::{
    Connect, Disconnect, GetConnectionCount, GetUserConnectionCount, NotificationPush,
    PublishNotification,
};
use crate::notifications::{NotificationData, PushChannel, PushError};
use actix::prelude::*;
use std::collections::HashMap;

struct Session {
    user_id: i32,
    recipient: Recipient<NotificationPush>,
}

pub struct NotificationServer {
    next_id: usize,
    mailbox_capacity: usize,
    sessions: HashMap<usize, Session>,
    /// User id -> session ids; a user may have several tabs or devices open
    by_user: HashMap<i32, Vec<usize>>,
}

impl NotificationServer {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            next_id: 0,
            mailbox_capacity: mailbox_capacity.max(1),
            sessions: HashMap::new(),
            by_user: HashMap::new(),
        }
    }

    fn push_to_user(&self, user_id: i32, frame: &str) -> usize {
        let Some(ids) = self.by_user.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for id in ids {
            if let Some(session) = self.sessions.get(id) {
                session.recipient.do_send(NotificationPush(frame.to_owned()));
                delivered += 1;
            }
        }
        delivered
    }
}

impl Default for NotificationServer {
    fn default() -> Self {
        Self::new(crate::app_config::NotificationsConfig::default().mailbox_capacity)
    }
}

impl Actor for NotificationServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.set_mailbox_capacity(self.mailbox_capacity);
        log::info!(
            "NotificationServer started (mailbox capacity {})",
            self.mailbox_capacity
        );
    }
}

impl Handler<Connect> for NotificationServer {
    type Result = usize;

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) -> Self::Result {
        let id = self.next_id;
        self.next_id += 1;

        self.sessions.insert(
            id,
            Session {
                user_id: msg.user_id,
                recipient: msg.addr,
            },
        );
        self.by_user.entry(msg.user_id).or_default().push(id);

        log::debug!(
            "Push session {} opened for user {} ({} live)",
            id,
            msg.user_id,
            self.sessions.len()
        );
        id
    }
}

impl Handler<Disconnect> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        let Some(session) = self.sessions.remove(&msg.id) else {
            return;
        };

        if let Some(ids) = self.by_user.get_mut(&session.user_id) {
            ids.retain(|&id| id != msg.id);
            if ids.is_empty() {
                self.by_user.remove(&session.user_id);
            }
        }

        log::debug!(
            "Push session {} closed for user {} ({} live)",
            msg.id,
            session.user_id,
            self.sessions.len()
        );
    }
}

impl Handler<PublishNotification> for NotificationServer {
    type Result = ();

    fn handle(&mut self, msg: PublishNotification, _: &mut Context<Self>) {
        let frame = serde_json::json!({
            "type": "notification",
            "data": msg.notification,
        });

        match serde_json::to_string(&frame) {
            Ok(frame) => {
                let delivered = self.push_to_user(msg.user_id, &frame);
                log::debug!(
                    "Notification {} pushed to {} session(s) of user {}",
                    msg.notification.id,
                    delivered,
                    msg.user_id
                );
            }
            Err(e) => log::error!("Failed to serialize notification {}: {}", msg.notification.id, e),
        }
    }
}

impl Handler<GetConnectionCount> for NotificationServer {
    type Result = usize;

    fn handle(&mut self, _: GetConnectionCount, _: &mut Context<Self>) -> Self::Result {
        self.sessions.len()
    }
}

impl Handler<GetUserConnectionCount> for NotificationServer {
    type Result = usize;

    fn handle(&mut self, msg: GetUserConnectionCount, _: &mut Context<Self>) -> Self::Result {
        self.by_user.get(&msg.user_id).map_or(0, Vec::len)
    }
}

impl Supervised for NotificationServer {
    fn restarting(&mut self, _: &mut Context<NotificationServer>) {
        log::warn!("Restarting the NotificationServer.");
    }
}

/// The hub publishes through the server's mailbox without waiting.
impl PushChannel for Addr<NotificationServer> {
    fn publish(&self, recipient_user_id: i32, payload: NotificationData) -> Result<(), PushError> {
        self.try_send(PublishNotification {
            user_id: recipient_user_id,
            notification: payload,
        })
        .map_err(|e| match e {
            SendError::Full(_) => PushError::Full,
            SendError::Closed(_) => PushError::Closed,
        })
    }
}
