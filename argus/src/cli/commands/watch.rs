use crate::cli::app::WatchArgs;
use anyhow::{Context, Result, bail};
use argus_core::WatchSession;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn execute(args: WatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = super::resolve_config(config_path.as_deref(), &args.paths, args.recursive)?;
    if let Some(size) = args.queue_size {
        config.dispatch_queue_size = size.max(1);
    }

    if config.watch.is_empty() {
        bail!("Nothing to watch: pass paths or a config file with [[watch]] entries");
    }

    let mut session = WatchSession::start(&config).await.context("Failed to start watcher")?;
    if session.registration().registered.is_empty() {
        warn!("No path could be registered, waiting anyway");
    }

    let mut events = session.take_events().context("Event stream unavailable")?;
    let mut stdout = std::io::stdout().lock();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping");
                break;
            }
            event = events.recv() => match event {
                Some(data) => {
                    writeln!(stdout, "{}", data)?;
                    stdout.flush()?;
                }
                None => break,
            },
        }
    }

    session.shutdown().await;

    // events flushed by the shutdown
    while let Ok(data) = events.try_recv() {
        writeln!(stdout, "{}", data)?;
    }
    stdout.flush()?;

    Ok(())
}
