//! Pure markdown renderers for tokens. No I/O.

use chrono::{TimeZone, Utc};

use crate::types::Token;

/// A token list longer than this is rendered with compact labels.
pub const COMPACT_THRESHOLD: usize = 10;

/// Multi-line markdown block with full token details.
pub fn token_detail(token: &Token) -> String {
    let expires = match token.expiry_time {
        Some(ms) => format_expiry(ms),
        None => "never".into(),
    };
    let uses = match token.uses_allowed {
        Some(n) => n.to_string(),
        None => "unlimited".into(),
    };
    let enabled = if token.disabled { "no" } else { "yes" };
    format!(
        "**Token:** `{}`\n**Expires:** {expires}\n**Uses allowed:** {uses}\n**Pending:** {}\n**Completed:** {}\n**Enabled:** {enabled}",
        token.token, token.pending, token.completed,
    )
}

/// Compact one-line label, used in comma-joined summaries.
pub fn token_label(token: &Token) -> String {
    format!("`{}`", token.token)
}

fn format_expiry(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => format!("{ms}"),
    }
}
