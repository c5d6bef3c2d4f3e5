// CLI error type and user-facing messages

use ochat_client::{ClientError, ConfigError, ErrorNotice};
use ochat_sessions::SessionError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A daemon or session failure, already reduced to its title/message pair
    #[error("{}: {}", .0.title, .0.message)]
    Server(ErrorNotice),

    #[error("Busy: a response is still streaming")]
    Busy,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        CliError::Server(err.notice())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SendInFlight => CliError::Busy,
            SessionError::NotFound(what) => CliError::NotFound(what),
            SessionError::Io(e) => CliError::Io(e),
            other => CliError::Server(other.notice()),
        }
    }
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'ochat --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(e) => {
                format!(
                    "{}\n\nRun 'ochat config show' to check your configuration.",
                    e
                )
            }
            CliError::Server(notice) => {
                if notice.title == "Server Unreachable" {
                    format!(
                        "{}: {}\n\nIs the Ollama daemon running? Check 'ochat config show'.",
                        notice.title, notice.message
                    )
                } else {
                    format!("{}: {}", notice.title, notice.message)
                }
            }
            CliError::Busy => "Busy: wait for the current response to finish.".to_string(),
            CliError::NotFound(what) => format!("Not found: {}", what),
            CliError::Internal(msg) => format!("Internal error: {}", msg),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
