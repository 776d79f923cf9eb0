//! Error types and Result alias for the quest log client

use thiserror::Error;

/// Main error type for the quest log client
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was missing or malformed before any remote call
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// The caller lacks the capability for this action (e.g. non-admin)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network or server failure, including `{error}` bodies
    #[error("Remote call failed: {0}")]
    RemoteFailure(String),

    #[error("Already started: {0}")]
    AlreadyStarted(String),

    #[error("Challenge cannot be claimed: {0}")]
    NotClaimable(String),

    #[error("Cannot {action} from state '{from}'")]
    InvalidTransition { action: String, from: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session token expired")]
    TokenExpired,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The view was detached while a request was in flight; the result was dropped
    #[error("View detached, result discarded")]
    Detached,
}

impl Error {
    /// Whether re-triggering the same action by hand might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RemoteFailure(_) | Error::TokenExpired)
    }

    /// Short text suitable for a confirmation/alert dialog
    pub fn user_message(&self) -> String {
        match self {
            Error::ValidationError(msg) => format!("Please check your input: {}", msg),
            Error::Unauthorized(_) => "Only admins can do that.".to_string(),
            Error::RemoteFailure(msg) => format!("Something went wrong: {}.", msg),
            Error::AlreadyStarted(_) => "You have already started this.".to_string(),
            Error::NotClaimable(_) => "This reward is not ready to claim yet.".to_string(),
            Error::InvalidTransition { action, from } => {
                format!("Cannot {} right now (currently {}).", action, from)
            }
            Error::NotFound(what) => format!("Could not find {}.", what),
            Error::TokenExpired => "Your session has expired. Please sign in again.".to_string(),
            Error::InvalidData(_) => {
                "The server sent something unexpected. Please refresh.".to_string()
            }
            Error::Detached => String::new(),
        }
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RemoteFailure(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
