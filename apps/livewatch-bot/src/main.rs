use anyhow::Result;
use clap::Parser;
use livewatch_core::{LivenessCheck, LivenessResolver, Normalizer};
use livewatch_db::repositories::{SubscriptionRepository, TargetRepository};
use std::io;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod services;
mod state;

use crate::bot::utils::parse_chat_list;
use crate::config::Args;
use crate::services::notification_service::NotificationService;
use crate::services::poll_scheduler::PollScheduler;
use crate::services::status_tracker::StatusTracker;
use crate::services::telegram_delivery::TelegramDelivery;
use crate::services::watch_service::WatchService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_file.as_deref());

    info!("Starting livewatch v{}", env!("CARGO_PKG_VERSION"));

    let engine = args.engine_config()?;
    let pool = livewatch_db::connect(&args.database_url).await?;
    let targets = TargetRepository::new(pool.clone());
    let subscriptions = SubscriptionRepository::new(pool);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let tracker = StatusTracker::new(targets.clone(), events_tx);
    let resolver: Arc<dyn LivenessCheck> = Arc::new(LivenessResolver::from_config(&engine));

    let scheduler = PollScheduler::new(
        targets.clone(),
        resolver.clone(),
        tracker.clone(),
        args.pacing(),
    );
    let watch = WatchService::new(
        Normalizer::new(engine.provider.clone()),
        resolver,
        targets,
        subscriptions.clone(),
        tracker,
    );

    let bot = Bot::new(&args.bot_token);
    let notifier = NotificationService::new(
        subscriptions,
        Arc::new(TelegramDelivery::new(bot.clone())),
    );
    tokio::spawn(notifier.run(events_rx));
    tokio::spawn(scheduler.clone().start(args.poll_interval()));

    let allowed_chats = parse_chat_list(&args.allowed_chats);
    if !allowed_chats.is_empty() {
        info!("Restricted to {} chats", allowed_chats.len());
    }
    let state = AppState {
        watch,
        scheduler,
        allowed_chats: Arc::new(allowed_chats),
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    bot::run_bot(bot, shutdown_rx, state).await;
    info!("livewatch stopped");
    Ok(())
}

/// stdout always, plus a plain-text file when `log_file` is set.
fn init_tracing(log_file: Option<&str>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "livewatch.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "livewatch_bot=info,livewatch_core=info,livewatch_db=info,sqlx=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(file_layer)
        .init();

    guard
}
