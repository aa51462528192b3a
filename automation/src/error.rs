//! Errors reported by the automation interfaces.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    /// No automation backend can serve the request on this machine.
    #[error("Automation interface is not available: {0}")]
    Unavailable(String),

    /// A call into the automation interface failed.
    #[error("{operation} failed: {message}")]
    CallFailed {
        operation: &'static str,
        message: String,
    },

    #[error("Tree item '{0}' not found")]
    TreeItemNotFound(String),
}

impl AutomationError {
    pub fn call_failed(operation: &'static str, message: impl Into<String>) -> Self {
        AutomationError::CallFailed {
            operation,
            message: message.into(),
        }
    }
}
