//! Messages exchanged between the push server and client sessions

use crate::notifications::NotificationData;
use actix::prelude::*;

/// A client session came online for a user.
pub struct Connect {
    /// Where pushes for this session go
    pub addr: Recipient<NotificationPush>,
    pub user_id: i32,
}

impl Message for Connect {
    /// Session id assigned by the server
    type Result = usize;
}

pub struct Disconnect {
    pub id: usize,
}

impl Message for Disconnect {
    type Result = ();
}

/// A stored notification to forward to every session of its recipient.
#[derive(Clone)]
pub struct PublishNotification {
    pub user_id: i32,
    pub notification: NotificationData,
}

impl Message for PublishNotification {
    type Result = ();
}

/// Serialized frame sent down a session's socket.
pub struct NotificationPush(pub String);

impl Message for NotificationPush {
    type Result = ();
}

/// Total live sessions.
pub struct GetConnectionCount;

impl Message for GetConnectionCount {
    type Result = usize;
}

/// Live sessions of one user.
pub struct GetUserConnectionCount {
    pub user_id: i32,
}

impl Message for GetUserConnectionCount {
    type Result = usize;
}
