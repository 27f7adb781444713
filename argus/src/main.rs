use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // stdout carries the event stream, logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Watch(args) => {
            debug!("Watch command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::watch::execute(args, cli.config))?;
        }
        Commands::Expand(args) => {
            debug!("Expand command: {:?}", args);
            cli::commands::expand::execute(args, cli.config)?;
        }
    }

    Ok(())
}
