//! Notification type definitions

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
pub enum NotificationType {
    #[sea_orm(string_value = "FOLLOW")]
    Follow, // Someone followed you
    #[sea_orm(string_value = "LIKE")]
    Like, // Someone liked your post
    #[sea_orm(string_value = "COMMENT")]
    Comment, // Someone commented on your post
    #[sea_orm(string_value = "FLAG_CREATED")]
    FlagCreated, // Your post was flagged
    #[sea_orm(string_value = "FLAG_APPROVED")]
    FlagApproved, // A flag on your post was upheld
    #[sea_orm(string_value = "FLAG_REJECTED")]
    FlagRejected, // A flag on your post was dismissed
    #[sea_orm(string_value = "WARNING")]
    Warning, // An admin warned you
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "FOLLOW",
            Self::Like => "LIKE",
            Self::Comment => "COMMENT",
            Self::FlagCreated => "FLAG_CREATED",
            Self::FlagApproved => "FLAG_APPROVED",
            Self::FlagRejected => "FLAG_REJECTED",
            Self::Warning => "WARNING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FOLLOW" => Some(Self::Follow),
            "LIKE" => Some(Self::Like),
            "COMMENT" => Some(Self::Comment),
            "FLAG_CREATED" => Some(Self::FlagCreated),
            "FLAG_APPROVED" => Some(Self::FlagApproved),
            "FLAG_REJECTED" => Some(Self::FlagRejected),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Social types are dropped when the actor is also the recipient.
    /// Moderation types always reach the recipient.
    pub fn suppressed_for_self(&self) -> bool {
        matches!(self, Self::Follow | Self::Like | Self::Comment)
    }
}
