//! Moderation and social-interaction core of the Agora social network.
//!
//! Each component is a cheap `Clone` handle over a pooled database
//! connection. Components that raise notifications share a
//! `NotificationHub`, which stores the notification and forwards it to the
//! configured `PushChannel`.

pub mod admin;
pub mod app_config;
pub mod comments;
pub mod db;
pub mod error;
pub mod flags;
pub mod follows;
pub mod notifications;
pub mod orm;
pub mod post;
pub mod session;
pub mod user;
pub mod votes;
pub mod warnings;
pub mod web;

pub use comments::CommentBoard;
pub use error::{CoreError, CoreResult};
pub use flags::FlagWorkflow;
pub use follows::FollowGraph;
pub use notifications::NotificationHub;
pub use session::SessionRegistry;
pub use votes::{InteractionLedger, PostStats, VoteState};
pub use warnings::WarningLog;
