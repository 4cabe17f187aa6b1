use {
    secrecy::Secret,
    serde::Deserialize,
    thiserror::Error,
};

/// Fatal configuration problems. The process does not start on these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),

    #[error("no access token or password for the bot provided")]
    MissingCredentials,
}

/// Root configuration, read from `regbot.{toml,yaml,yml,json}`.
#[derive(Debug, Deserialize)]
pub struct RegbotConfig {
    pub bot: BotSection,
    pub api: ApiSection,
}

/// The Matrix side: homeserver, identity, credential.
#[derive(Debug, Deserialize)]
pub struct BotSection {
    /// Homeserver base URL, e.g. `https://matrix.example.org`.
    pub homeserver: String,

    /// Full MXID when authenticating with an access token; a localpart
    /// is fine for password login.
    pub username: String,

    #[serde(default)]
    pub access_token: Option<Secret<String>>,

    #[serde(default)]
    pub password: Option<Secret<String>>,

    /// Device id used when restoring a session from an access token.
    #[serde(default = "default_device_id")]
    pub device_id: String,
}

/// The registration-token admin API side.
#[derive(Debug, Deserialize)]
pub struct ApiSection {
    pub base_url: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Admin bearer token.
    pub token: Secret<String>,
}

fn default_device_id() -> String {
    "REGBOT".into()
}

fn default_endpoint() -> String {
    "/_synapse/admin/v1/registration_tokens".into()
}

/// How the bot authenticates against the homeserver.
#[derive(Debug)]
pub enum Credentials {
    /// Restore a session from an existing access token.
    AccessToken {
        token: Secret<String>,
        device_id: String,
    },
    /// Log in with a password, persisting the resulting session.
    Password(Secret<String>),
}

impl BotSection {
    /// Resolve the credential: access token takes precedence over
    /// password; neither present is fatal.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(token) = &self.access_token {
            return Ok(Credentials::AccessToken {
                token: token.clone(),
                device_id: self.device_id.clone(),
            });
        }
        if let Some(password) = &self.password {
            return Ok(Credentials::Password(password.clone()));
        }
        Err(ConfigError::MissingCredentials)
    }
}
