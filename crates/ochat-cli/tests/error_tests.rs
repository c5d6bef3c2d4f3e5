//! Error handling tests
//!
//! Tests for CLI error types and user-friendly messages.

use ochat_cli::error::CliError;
use ochat_client::{ClientError, ConfigError};
use ochat_sessions::SessionError;

#[test]
fn test_unreachable_user_message() {
    let error = CliError::from(ClientError::Unreachable("connection refused".to_string()));
    let msg = error.user_message();
    assert!(msg.starts_with("Server Unreachable: "));
    assert!(msg.contains("connection refused"));
    assert!(msg.contains("ochat config show"));
}

#[test]
fn test_invalid_response_user_message() {
    let error = CliError::from(ClientError::InvalidResponse {
        status: 404,
        body: "model not found".to_string(),
    });
    let msg = error.user_message();
    assert!(msg.starts_with("Invalid Response"));
    assert!(msg.contains("404"));
}

#[test]
fn test_session_errors_map() {
    assert!(matches!(
        CliError::from(SessionError::SendInFlight),
        CliError::Busy
    ));
    assert!(matches!(
        CliError::from(SessionError::NotFound("abc".to_string())),
        CliError::NotFound(_)
    ));
    assert!(matches!(
        CliError::from(SessionError::Client(ClientError::InvalidData(
            "bad record".to_string()
        ))),
        CliError::Server(_)
    ));
}

#[test]
fn test_config_error_user_message() {
    let error = CliError::from(ConfigError::UnknownKey("colour".to_string()));
    let msg = error.user_message();
    assert!(msg.contains("colour"));
    assert!(msg.contains("ochat config show"));
}

#[test]
fn test_invalid_argument_user_message() {
    let error = CliError::InvalidArgument {
        message: "No models installed".to_string(),
    };
    let msg = error.user_message();
    assert!(msg.contains("Invalid argument"));
    assert!(msg.contains("No models installed"));
}

#[test]
fn test_technical_details() {
    let error = CliError::Internal("boom".to_string());
    assert!(error.technical_details().contains("Internal"));
}
