use thiserror::Error;

/// Errors from the registration-token API.
///
/// Display strings are chat-presentable: the dispatcher forwards them
/// verbatim as `Error: ...` replies for per-token failures.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The token id is well-formed but the service does not know it.
    #[error("Token {token} does not exist")]
    NotFound { token: String },

    /// The service rejected the token id as malformed.
    #[error("{token} is not a valid registration token")]
    InvalidToken { token: String },

    /// Any other non-2xx response from the service.
    #[error("registration service returned {status}: {body}")]
    Service {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Transport-level failure before a response was received.
    #[error("registration service unreachable: {0}")]
    Http(#[from] reqwest::Error),
}
