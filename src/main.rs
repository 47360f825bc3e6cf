//! Rooster — scheduled Telegram broadcast bot.
//!
//! Boot order: parse args, init tracing, load and validate config (any
//! gap is fatal here, never at 08:00), open the subscriber directory,
//! wire collaborators, then run the scheduler loop and the polling loop
//! side by side until ctrl-c.

mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rooster_broadcast::Dispatcher;
use rooster_content::{MessageCatalog, PixabayClient};
use rooster_core::traits::{ImageSearch, Transport};
use rooster_core::RoosterConfig;
use rooster_directory::Directory;
use rooster_scheduler::{Job, Scheduler};
use rooster_telegram::TelegramClient;

use commands::CommandRouter;

#[derive(Parser, Debug)]
#[command(name = "rooster", about = "Scheduled Telegram broadcast bot")]
struct Args {
    /// Path to the config file (default: ~/.rooster/config.toml).
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("rooster={default_level},warn"))),
        )
        .init();

    let config = match &args.config {
        Some(path) => RoosterConfig::load_from(path),
        None => RoosterConfig::load(),
    }
    .context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let offset = config.broadcast.utc_offset()?;

    // Storage must be reachable at boot; a failure here refuses to start.
    let directory = Arc::new(
        Directory::open(&config.storage.db_path).context("opening subscriber directory")?,
    );
    tracing::info!(
        "directory open with {} subscriber(s)",
        directory.len().unwrap_or(0)
    );

    let catalog = Arc::new(MessageCatalog::new(config.broadcast.messages.clone())?);

    let images: Option<Arc<dyn ImageSearch>> = if config.broadcast.image_api_key.is_empty() {
        tracing::info!("image enrichment disabled (no API key)");
        None
    } else {
        Some(Arc::new(PixabayClient::new(
            config.broadcast.image_api_key.clone(),
        )?))
    };

    let transport: Arc<dyn Transport> =
        Arc::new(TelegramClient::new(config.telegram.clone()));

    let poller = TelegramClient::new(config.telegram.clone());
    let me = poller.get_me().await.context("connecting to Telegram")?;
    tracing::info!(
        "connected as @{} ({})",
        me.username.as_deref().unwrap_or("unknown"),
        me.first_name
    );

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&directory),
        catalog,
        Arc::clone(&transport),
        images,
        config.broadcast.image_topic.clone(),
        config.broadcast.max_in_flight,
    ));

    let jobs: Vec<Job> = config
        .schedule
        .iter()
        .enumerate()
        .map(|(i, fire)| {
            Job::daily(&format!("daily-{:02}{:02}-{i}", fire.hour, fire.minute), *fire)
                .with_topic(config.broadcast.image_topic.clone())
        })
        .collect();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(jobs, offset);
    let scheduler_dispatcher = Arc::clone(&dispatcher);
    let scheduler_handle = tokio::spawn(scheduler.run(
        move |job| {
            let dispatcher = Arc::clone(&scheduler_dispatcher);
            async move {
                let report = dispatcher.run_broadcast(job.topic_hint.as_deref()).await;
                tracing::info!("job '{}': {report}", job.name);
            }
        },
        shutdown_rx,
    ));

    let router = CommandRouter::new(
        Arc::clone(&directory),
        dispatcher,
        transport,
        config.admin.password.clone(),
    );

    let mut events = poller.start_polling();
    loop {
        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(event) => router.handle(event).await,
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    // Let the scheduler wind down; in-flight broadcast passes are detached
    // tasks and simply run to completion.
    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;
    Ok(())
}
