//! Error taxonomy shared by every layer.
//!
//! Four kinds, each carrying a human-readable message and an optional wrapped
//! cause. The message is what callers (and HTTP clients) see; the cause is
//! logged server-side only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// Inputs violate structural rules; the caller must fix and retry.
    #[error("{message}")]
    Validation { message: String },

    /// A referenced slot, material or operation does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// A precondition failed, the optimistic version check lost, or the shelf
    /// lease is held by another writer.
    #[error("{message}")]
    Conflict {
        message: String,
        #[source]
        cause: Option<anyhow::Error>,
    },

    /// Infrastructure failure (database, cache, bus, marshalling).
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        cause: Option<anyhow::Error>,
    },
}

impl InventoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        InventoryError::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        InventoryError::Conflict {
            message: message.into(),
            cause: None,
        }
    }

    pub fn conflict_with(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        InventoryError::Conflict {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        InventoryError::Internal {
            message: message.into(),
            cause: None,
        }
    }

    pub fn internal_with(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        InventoryError::Internal {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::Validation { .. } => "validation",
            InventoryError::NotFound { .. } => "not_found",
            InventoryError::Conflict { .. } => "conflict",
            InventoryError::Internal { .. } => "internal",
        }
    }

    /// Transient errors are worth retrying from an asynchronous caller (the
    /// shelf bridge); the rest are surfaced immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InventoryError::Conflict { .. } | InventoryError::Internal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_hides_the_wrapped_cause() {
        let err = InventoryError::conflict_with(
            "slot is not available",
            anyhow::anyhow!("version check: expected 3, row at 4"),
        );
        assert_eq!(err.to_string(), "slot is not available");
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn transient_kinds() {
        assert!(InventoryError::conflict("x").is_transient());
        assert!(InventoryError::internal("x").is_transient());
        assert!(!InventoryError::validation("x").is_transient());
        assert!(!InventoryError::not_found("x").is_transient());
    }
}
