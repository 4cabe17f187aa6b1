//! The per-message dispatch cycle: authorization check, command
//! dispatch, reply rendering.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use regbot_registration::{
    Token, TokenService,
    render::{COMPACT_THRESHOLD, token_detail, token_label},
};

use crate::{allowlist::Allowlist, help::HELP_TEXT, parse::Command};

/// Reply when list/create/delete-all cannot reach the service.
const SERVICE_ERROR_REPLY: &str = "Could not reach the registration service.";

/// Reply when a token argument is required but missing.
const MISSING_TOKEN_REPLY: &str = "You must give a token!";

/// Reply for `list` when no tokens exist.
const EMPTY_LIST_REPLY: &str = "No tokens";

/// Outbound side of the chat transport. Implemented over a Matrix room
/// by the binary and by a recording fake in tests.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
    async fn send_markdown(&self, markdown: &str) -> Result<()>;
}

/// Context for one bot instance: the token service, the allow-list,
/// and the bot's own identity for self-message filtering.
pub struct Dispatcher {
    api: Arc<dyn TokenService>,
    allowlist: Mutex<Allowlist>,
    own_user_id: String,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn TokenService>, allowlist: Allowlist, own_user_id: String) -> Self {
        Self {
            api,
            allowlist: Mutex::new(allowlist),
            own_user_id,
        }
    }

    /// Run one dispatch cycle for an inbound message.
    ///
    /// Command failures are converted to chat replies here; the only
    /// errors that escape are outbound send failures, which the event
    /// loop logs without stopping.
    pub async fn handle_message(&self, out: &dyn Outbound, sender: &str, body: &str) -> Result<()> {
        if sender == self.own_user_id {
            return Ok(());
        }

        let Some(command) = Command::parse(body) else {
            return Ok(());
        };

        // Help stays accessible to users that are not allow-listed.
        if command == Command::Help {
            return out.send_markdown(HELP_TEXT).await;
        }

        if !self.allowlist.lock().await.contains(sender) {
            debug!(sender = %sender, "ignoring restricted command from unlisted sender");
            return Ok(());
        }

        match command {
            Command::Help => out.send_markdown(HELP_TEXT).await,
            Command::List => self.list(out).await,
            Command::Create => self.create(out, sender).await,
            Command::DeleteAll => self.delete_all(out, sender).await,
            Command::Delete(args) => self.delete(out, sender, &args).await,
            Command::Show(args) => self.show(out, &args).await,
            Command::Allow(args) => self.allow(out, sender, args).await,
            Command::Disallow(args) => self.disallow(out, sender, args).await,
        }
    }

    async fn list(&self, out: &dyn Outbound) -> Result<()> {
        let tokens = match self.api.list_tokens().await {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(error = %err, "listing tokens failed");
                return out.send_text(SERVICE_ERROR_REPLY).await;
            },
        };
        let message = if tokens.is_empty() {
            EMPTY_LIST_REPLY.to_string()
        } else if tokens.len() < COMPACT_THRESHOLD {
            tokens.iter().map(token_detail).collect::<Vec<_>>().join("\n")
        } else {
            let labels: Vec<String> = tokens.iter().map(token_label).collect();
            format!("All tokens: {}", labels.join(", "))
        };
        out.send_markdown(&message).await
    }

    async fn create(&self, out: &dyn Outbound, sender: &str) -> Result<()> {
        match self.api.create_token().await {
            Ok(token) => {
                info!(actor = %sender, token = %token.token, "created token");
                out.send_markdown(&token_detail(&token)).await
            },
            Err(err) => {
                warn!(actor = %sender, error = %err, "creating token failed");
                out.send_text(SERVICE_ERROR_REPLY).await
            },
        }
    }

    async fn delete_all(&self, out: &dyn Outbound, sender: &str) -> Result<()> {
        match self.api.delete_all_tokens().await {
            Ok(deleted) => {
                info!(actor = %sender, count = deleted.len(), "deleted all tokens");
                out.send_markdown(&deleted_summary(&deleted)).await
            },
            Err(err) => {
                warn!(actor = %sender, error = %err, "deleting all tokens failed");
                out.send_text(SERVICE_ERROR_REPLY).await
            },
        }
    }

    async fn delete(&self, out: &dyn Outbound, sender: &str, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return out.send_markdown(MISSING_TOKEN_REPLY).await;
        }
        let mut deleted: Vec<Token> = Vec::new();
        for arg in args {
            match self.api.delete_token(arg).await {
                Ok(token) => deleted.push(token),
                Err(err) => out.send_text(&format!("Error: {err}")).await?,
            }
        }
        let ids: Vec<&str> = deleted.iter().map(|t| t.token.as_str()).collect();
        info!(actor = %sender, deleted = ?ids, "deleted tokens");
        out.send_markdown(&deleted_summary(&deleted)).await
    }

    async fn show(&self, out: &dyn Outbound, args: &[String]) -> Result<()> {
        if args.is_empty() {
            return out.send_markdown(MISSING_TOKEN_REPLY).await;
        }
        let mut details: Vec<String> = Vec::new();
        for arg in args {
            match self.api.get_token(arg).await {
                Ok(token) => details.push(token_detail(&token)),
                Err(err) => out.send_text(&format!("Error: {err}")).await?,
            }
        }
        if details.is_empty() {
            return Ok(());
        }
        out.send_markdown(&details.join("\n")).await
    }

    async fn allow(&self, out: &dyn Outbound, sender: &str, args: Vec<String>) -> Result<()> {
        let reply = format!("allowing {}", args.join(", "));
        let mut allowlist = self.allowlist.lock().await;
        let added = allowlist.add(args);
        if let Err(err) = allowlist.save() {
            warn!(error = %err, "failed to persist allowlist");
        }
        drop(allowlist);
        info!(actor = %sender, added = ?added, "extended allowlist");
        out.send_text(&reply).await
    }

    async fn disallow(&self, out: &dyn Outbound, sender: &str, args: Vec<String>) -> Result<()> {
        let reply = format!("disallowing {}", args.join(", "));
        let mut allowlist = self.allowlist.lock().await;
        let removed = allowlist.remove(args);
        if let Err(err) = allowlist.save() {
            warn!(error = %err, "failed to persist allowlist");
        }
        drop(allowlist);
        info!(actor = %sender, removed = ?removed, "reduced allowlist");
        out.send_text(&reply).await
    }
}

/// "Deleted the following token(s): ..." or "No token deleted".
fn deleted_summary(tokens: &[Token]) -> String {
    if tokens.is_empty() {
        return "No token deleted".into();
    }
    let labels: Vec<String> = tokens.iter().map(token_label).collect();
    format!("Deleted the following token(s): {}", labels.join(", "))
}
