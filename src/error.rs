//! Error types for spark-prompt

use thiserror::Error;

/// Failure raised by a widget from `render`, `handle_input` or `handle_mouse`.
pub type WidgetError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ways a prompt session can fail to produce a value.
///
/// Every variant is returned only after the session has restored the terminal.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The user pressed the interrupt key.
    #[error("prompt cancelled by user")]
    Cancelled,

    /// The widget failed while rendering or handling input.
    #[error("widget error: {0}")]
    Widget(#[source] WidgetError),

    /// The input stream ended before the widget submitted.
    #[error("input stream closed")]
    InputClosed,

    /// Another session already owns the terminal.
    #[error("another prompt session is active")]
    SessionBusy,

    /// `run` was called on a session that is no longer idle.
    #[error("session already started")]
    AlreadyStarted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PromptError {
    /// Whether this error is the user's interrupt rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widget_error_keeps_source() {
        let err = PromptError::Widget("bad state".into());
        assert_eq!(err.to_string(), "widget error: bad state");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn io_converts() {
        let err: PromptError = std::io::Error::other("tty gone").into();
        assert!(matches!(err, PromptError::Io(_)));
        assert_eq!(err.to_string(), "tty gone");
    }

    #[test]
    fn cancelled_is_flagged() {
        assert!(PromptError::Cancelled.is_cancelled());
    }
}
