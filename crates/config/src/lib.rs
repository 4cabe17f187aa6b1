//! Bot configuration: schema, multi-format loader, credential
//! resolution.

pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, load},
    schema::{ApiSection, BotSection, ConfigError, Credentials, RegbotConfig},
};
