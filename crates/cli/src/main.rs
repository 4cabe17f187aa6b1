mod outbound;
mod session;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::{Context, Result, anyhow},
    clap::Parser,
    matrix_sdk::{
        Client, SessionMeta,
        authentication::{SessionTokens, matrix::MatrixSession},
        config::SyncSettings,
        room::Room,
        ruma::{
            UserId,
            events::room::{
                member::{MembershipState, StrippedRoomMemberEvent},
                message::{MessageType, OriginalSyncRoomMessageEvent},
            },
        },
    },
    secrecy::ExposeSecret,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    regbot_commands::{Allowlist, Dispatcher},
    regbot_config::{Credentials, RegbotConfig},
    regbot_registration::RegistrationClient,
};

use crate::{
    outbound::RoomOutbound,
    session::{SavedSession, load_session, save_session},
};

#[derive(Parser, Debug)]
#[command(name = "regbot", version, about = "Matrix bot for managing Synapse registration tokens")]
struct Args {
    /// Config file path; defaults to regbot.{toml,yaml,yml,json} in the
    /// working directory or ~/.config/regbot/.
    #[arg(long, env = "REGBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for persistent state (sync store, session file,
    /// allow-list). Defaults to the config directory.
    #[arg(long, env = "REGBOT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_telemetry(&args);

    let config = regbot_config::load(args.config.as_deref())?;
    // Credential resolution is fatal before anything else starts.
    let credentials = config.bot.credentials()?;

    let state_dir = args.state_dir.clone().unwrap_or_else(regbot_config::config_dir);
    std::fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating state directory at {}", state_dir.display()))?;

    let client = Client::builder()
        .homeserver_url(&config.bot.homeserver)
        .sqlite_store(state_dir.join("store"), None)
        .build()
        .await
        .context("building matrix client")?;

    establish_session(&client, &config, credentials, &state_dir.join("session.json")).await?;
    let own_user_id = client
        .user_id()
        .context("no user id after session setup")?
        .to_string();
    info!(user = %own_user_id, "session ready");

    let api = RegistrationClient::new(
        &config.api.base_url,
        &config.api.endpoint,
        config.api.token.clone(),
    );
    let allowlist = Allowlist::load(state_dir.join("allowlist.toml"))?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(api), allowlist, own_user_id));

    client.add_event_handler(on_invite);

    client.add_event_handler(move |ev: OriginalSyncRoomMessageEvent, room: Room| {
        let dispatcher = dispatcher.clone();
        async move {
            let body = match &ev.content.msgtype {
                MessageType::Text(t) => t.body.clone(),
                MessageType::Notice(n) => n.body.clone(),
                _ => return,
            };
            let outbound = RoomOutbound::new(room);
            if let Err(e) = dispatcher
                .handle_message(&outbound, ev.sender.as_str(), &body)
                .await
            {
                warn!(error = %e, sender = %ev.sender, "dispatch failed");
            }
        }
    });

    info!("starting sync loop");
    client
        .sync(SyncSettings::default())
        .await
        .map_err(|e| anyhow!("sync terminated: {e}"))
}

/// Restore a saved session, restore from a configured access token, or
/// log in with the password (persisting the session for next time).
async fn establish_session(
    client: &Client,
    config: &RegbotConfig,
    credentials: Credentials,
    session_file: &Path,
) -> Result<()> {
    if let Some(saved) = load_session(session_file)? {
        info!(user = %saved.user_id, "restoring saved session");
        let session = MatrixSession {
            meta: SessionMeta {
                user_id: saved.user_id.parse().context("invalid stored user_id")?,
                device_id: saved.device_id.into(),
            },
            tokens: SessionTokens {
                access_token: saved.access_token,
                refresh_token: saved.refresh_token,
            },
        };
        client
            .restore_session(session)
            .await
            .context("restoring saved session")?;
        return Ok(());
    }

    match credentials {
        Credentials::AccessToken { token, device_id } => {
            let user_id = UserId::parse(&config.bot.username).context(
                "bot.username must be a full user id (@user:server) when using access_token",
            )?;
            info!(user = %user_id, "restoring session from configured access token");
            let session = MatrixSession {
                meta: SessionMeta {
                    user_id,
                    device_id: device_id.into(),
                },
                tokens: SessionTokens {
                    access_token: token.expose_secret().clone(),
                    refresh_token: None,
                },
            };
            client
                .restore_session(session)
                .await
                .context("restoring session from access token")?;
        },
        Credentials::Password(password) => {
            info!(user = %config.bot.username, "using password based authentication for the bot");
            let response = client
                .matrix_auth()
                .login_username(&config.bot.username, password.expose_secret())
                .initial_device_display_name("regbot")
                .send()
                .await
                .context("login failed")?;
            let saved = SavedSession {
                access_token: response.access_token.clone(),
                refresh_token: response.refresh_token.clone(),
                user_id: response.user_id.to_string(),
                device_id: response.device_id.to_string(),
            };
            save_session(session_file, &saved)?;
            info!(user = %saved.user_id, device = %saved.device_id, "logged in");
        },
    }
    Ok(())
}

/// Accept room invites addressed to the bot.
async fn on_invite(ev: StrippedRoomMemberEvent, room: Room, client: Client) {
    if ev.content.membership != MembershipState::Invite {
        return;
    }
    let Some(own_id) = client.user_id() else {
        return;
    };
    if ev.state_key != own_id.as_str() {
        return;
    }
    info!(room_id = %room.room_id(), "auto-joining invited room");
    if let Err(e) = room.join().await {
        warn!(error = %e, "failed to accept invite");
    }
}
