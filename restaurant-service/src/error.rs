use thiserror::Error;
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Service-wide error type.
///
/// Every failure a caller can observe is one of these kinds; none of them
/// is retried internally. [`ServiceError::Unavailable`] is the only
/// transient class and the sole candidate for caller-initiated retry.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Menu item {menu_item_id} not found or inactive")]
    InvalidReference { menu_item_id: Uuid },

    #[error("Cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl ServiceError {
    /// Whether a caller may reasonably retry the failed call as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ServiceError::Conflict(err.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                ServiceError::Unavailable(anyhow::Error::new(err))
            }
            _ => ServiceError::Database(anyhow::Error::new(err)),
        }
    }
}

/// Error for stored rows that fail to decode into domain types.
pub(crate) fn bad_row(context: &str) -> ServiceError {
    ServiceError::Database(anyhow::anyhow!("corrupt row: {context}"))
}
