//! JSON session file so a password login only happens once.

use std::path::Path;

use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
};

/// Tokens and identity from a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub device_id: String,
}

pub fn load_session(path: &Path) -> Result<Option<SavedSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading session file at {}", path.display()))?;
    let session = serde_json::from_str(&data).context("parsing session JSON")?;
    Ok(Some(session))
}

pub fn save_session(path: &Path, session: &SavedSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(session)?;
    std::fs::write(path, data)
        .with_context(|| format!("writing session file at {}", path.display()))?;
    Ok(())
}
