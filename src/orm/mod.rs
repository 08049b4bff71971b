//! SeaORM entities for every table the core reads or writes.

pub mod notifications;
pub mod post_comments;
pub mod post_flags;
pub mod post_votes;
pub mod posts;
pub mod user_follows;
pub mod user_warnings;
pub mod users;
