use thiserror::Error;

/// Errors raised by the browser automation surface
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    #[error("Browser session is closed")]
    Closed,
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

impl BrowserError {
    /// Builds a navigation error for `url`
    pub fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
