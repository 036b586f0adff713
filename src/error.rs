//! Error types for deck
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid config, validation failure)
//! - 4: Operation failed (HTTP error, malformed API payload)

use thiserror::Error;

/// Exit codes for the deck CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for deck operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    // Operation failures (exit code 4)
    #[error("API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned invalid task payload: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::TaskNotFound(_) => {
                exit_codes::USER_ERROR
            }
            Error::Api { .. }
            | Error::Http(_)
            | Error::MalformedResponse(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Transient message shown in the board feedback line. Backend-provided
    /// messages pass through, then the transport's own description; only a
    /// blank message falls back to the generic string.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Error::InvalidArgument(message) => message.clone(),
            Error::Http(err) => {
                let message = err.to_string();
                if message.trim().is_empty() {
                    "Something went wrong. Please try again.".to_string()
                } else {
                    message
                }
            }
            Error::Api { .. } | Error::MalformedResponse(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for deck operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_split_user_and_operation_errors() {
        assert_eq!(
            Error::InvalidArgument("title cannot be empty".to_string()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::MalformedResponse("missing id".to_string()).exit_code(),
            exit_codes::OPERATION_FAILED
        );
    }

    #[test]
    fn user_message_prefers_backend_message() {
        let err = Error::Api {
            status: Some(409),
            message: "Order conflict".to_string(),
        };
        assert_eq!(err.user_message(), "Order conflict");

        let blank = Error::Api {
            status: Some(500),
            message: "  ".to_string(),
        };
        assert_eq!(blank.user_message(), "Something went wrong. Please try again.");
    }

    #[test]
    fn user_message_surfaces_transport_error_text() {
        let source = reqwest::Client::new()
            .get("http://")
            .build()
            .expect_err("empty host is rejected");
        let err = Error::from(source);

        let message = err.user_message();
        assert!(!message.trim().is_empty());
        assert_ne!(message, "Something went wrong. Please try again.");
    }
}
