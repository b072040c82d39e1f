//! Error types for the order presentation crate.
//!
//! The reconciliation core itself cannot fail: merge and classification are
//! total over their inputs, and missing data degrades to a soft-error
//! presentation instead of an error value. Errors exist only at the
//! capability seams (clipboard, QR backend, event publication).

use thiserror::Error;

/// Order presentation error type.
#[derive(Debug, Error)]
pub enum OrderUiError {
    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("QR backend error: {0}")]
    QrBackend(String),

    #[error("subscription error: {0}")]
    Subscription(String),
}

/// Crate result type.
pub type Result<T> = std::result::Result<T, OrderUiError>;
