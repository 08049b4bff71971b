//! Error types shared by the moderation and interaction components.

use sea_orm::DbErr;

/// Result alias used by every component operation.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure reported synchronously to the caller of a component operation.
#[derive(Debug)]
pub enum CoreError {
    /// Referenced user, post, flag, warning, comment or notification is absent
    NotFound(String),
    /// Caller lacks the role required for the action
    Unauthorized(String),
    /// Empty message, invalid status value, blank text
    InvalidArgument(String),
    /// Transition not legal from the record's current state
    InvalidState(String),
    /// Action aimed at a target it may not be applied to
    InvalidTarget(String),
    /// Storage layer failure
    Database(DbErr),
}

impl CoreError {
    pub fn not_found(what: &str, id: i32) -> Self {
        CoreError::NotFound(format!("{} {}", what, id))
    }

    /// True for the error kinds that describe caller mistakes rather than
    /// infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Database(_))
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CoreError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            CoreError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CoreError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            CoreError::InvalidTarget(msg) => write!(f, "Invalid target: {}", msg),
            CoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbErr> for CoreError {
    fn from(e: DbErr) -> Self {
        CoreError::Database(e)
    }
}
