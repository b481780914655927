#![forbid(unsafe_code)]

//! `moderation-relay` server binary.
//!
//! Bootstraps configuration and credentials, builds the platform clients,
//! then runs the HTTP server, the Telegram delivery adapter and the
//! retention sweep until Ctrl-C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use moderation_relay::config::{GlobalConfig, TelegramDelivery};
use moderation_relay::messenger::client::GraphClient;
use moderation_relay::state::AppState;
use moderation_relay::telegram::client::BotClient;
use moderation_relay::telegram::delivery;
use moderation_relay::workflow::retention;
use moderation_relay::{server, AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "moderation-relay", about = "Messenger to Telegram moderation relay", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("moderation-relay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        delivery = ?config.telegram.delivery,
        port = config.http_port,
        "configuration loaded"
    );

    // ── Build platform clients and shared state ─────────
    let graph = Arc::new(GraphClient::new(&config.messenger)?);
    let bot = Arc::new(BotClient::new(&config.telegram)?);
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        graph.clone(),
        bot.clone(),
        graph,
    ));

    let ct = CancellationToken::new();

    // ── Start background services ───────────────────────
    let retention_handle = retention::spawn_retention_task(Arc::clone(&state), ct.clone());

    let polling_handle = match config.telegram.delivery {
        TelegramDelivery::Poll => Some(delivery::spawn_polling(
            Arc::clone(&state),
            Arc::clone(&bot),
            ct.clone(),
        )),
        TelegramDelivery::Webhook => {
            delivery::register_webhook(&bot, &config).await?;
            None
        }
    };

    let http_ct = ct.clone();
    let http_state = Arc::clone(&state);
    let http_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(http_state, http_ct.clone()).await {
            error!(%err, "http server failed");
            http_ct.cancel();
        }
    });

    info!("moderation relay ready");

    // ── Wait for shutdown ───────────────────────────────
    tokio::select! {
        signal = shutdown_signal() => info!(signal, "shutdown signal received"),
        () = ct.cancelled() => warn!("a service stopped unexpectedly"),
    }
    ct.cancel();

    let _ = tokio::join!(http_handle, retention_handle);
    if let Some(handle) = polling_handle {
        let _ = handle.await;
    }

    let pending = state.submissions.pending_count().await;
    if pending > 0 {
        warn!(pending, "in-memory submissions dropped at shutdown");
    }
    info!("moderation-relay shut down");
    Ok(())
}

/// Resolves with the name of the first termination signal received.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                warn!(%err, "SIGTERM unavailable, waiting for ctrl-c");
                return interrupted().await;
            }
        };
        tokio::select! {
            name = interrupted() => name,
            _ = sigterm.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    interrupted().await
}

async fn interrupted() -> &'static str {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "ctrl-c handler failed");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Filter used when `RUST_LOG` is unset. teloxide logs every polling retry
/// at info level through `log`.
const DEFAULT_LOG_FILTER: &str = "info,teloxide=warn,teloxide_core=warn";

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = fmt().with_env_filter(filter);

    let installed = match log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| AppError::Config(format!("tracing subscriber not installed: {err}")))
}
