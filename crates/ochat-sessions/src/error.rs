//! Error types for session operations

use ochat_client::{ClientError, ErrorNotice};
use thiserror::Error;

/// Errors that can occur in session and store operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failure talking to the model server
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Another turn is still streaming on this session
    #[error("A response is still streaming; wait for it to finish")]
    SendInFlight,

    #[error("Exchange not found: {0}")]
    ExchangeNotFound(usize),

    /// Response text is frozen once the exchange ends
    #[error("Exchange {0} is already complete")]
    ExchangeClosed(usize),

    /// A streamed update did not continue from the text already held
    #[error("Response update for exchange {0} does not extend existing text")]
    NonAppendUpdate(usize),

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Title/message pair for display
    pub fn notice(&self) -> ErrorNotice {
        match self {
            SessionError::Client(err) => err.notice(),
            SessionError::SendInFlight => ErrorNotice {
                title: "Busy".to_string(),
                message: self.to_string(),
            },
            other => ErrorNotice {
                title: "Error".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
