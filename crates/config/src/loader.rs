use std::path::{Path, PathBuf};

use tracing::debug;

use crate::schema::{ConfigError, RegbotConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["regbot.toml", "regbot.yaml", "regbot.yml", "regbot.json"];

/// Load the config: from `path` when given, otherwise from the first
/// file found in the standard locations. A missing file is fatal —
/// there is no useful default homeserver to fall back to.
pub fn load(path: Option<&Path>) -> Result<RegbotConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config_file().ok_or_else(|| {
            ConfigError::NotFound(format!(
                "{} or {}",
                CONFIG_FILENAMES[0],
                config_dir().join(CONFIG_FILENAMES[0]).display()
            ))
        })?,
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    debug!(path = %path.display(), "loading config");
    let raw = std::fs::read_to_string(&path)?;
    let raw = substitute_env(&raw);
    parse_config(&raw, &path)
}

/// The config/state directory: `~/.config/regbot/`.
pub fn config_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".config").join("regbot"))
        .unwrap_or_else(|| PathBuf::from(".regbot"))
}

fn find_config_file() -> Option<PathBuf> {
    // Project-local first, then user-global.
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }
    let dir = config_dir();
    for name in CONFIG_FILENAMES {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn parse_config(raw: &str, path: &Path) -> Result<RegbotConfig, ConfigError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
        other => Err(ConfigError::UnsupportedFormat(other.to_owned())),
    }
}

/// Replace `${ENV_VAR}` placeholders. Unresolvable or malformed
/// placeholders stay as written, so secrets can also be given inline.
fn substitute_env(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('}') {
            Some(end) if end > 0 => {
                let name = &tail[..end];
                match std::env::var(name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &tail[end + 1..];
            },
            _ => {
                result.push_str("${");
                rest = tail;
            },
        }
    }
    result.push_str(rest);
    result
}
