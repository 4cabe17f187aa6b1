use serde::{Deserialize, Serialize};

/// A registration token as returned by the Synapse admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The token string users enter at registration.
    pub token: String,

    /// How many registrations this token permits. `None` = unlimited.
    #[serde(default)]
    pub uses_allowed: Option<i64>,

    /// Registrations started but not yet completed with this token.
    #[serde(default)]
    pub pending: i64,

    /// Registrations completed with this token.
    #[serde(default)]
    pub completed: i64,

    /// Expiry as milliseconds since the epoch. `None` = never expires.
    #[serde(default)]
    pub expiry_time: Option<i64>,

    /// Whether the token has been disabled server-side.
    #[serde(default)]
    pub disabled: bool,
}

/// Envelope around the token collection endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenListResponse {
    pub registration_tokens: Vec<Token>,
}
