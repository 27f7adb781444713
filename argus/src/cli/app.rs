use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "argus",
    version,
    about = "Argus - Watch files and directories and stream normalized change events",
    long_about = "Argus watches plain files, wildcard patterns such as '/var/log/*.log' and whole directory trees, and prints one JSON change event per line: {\"Timestamp\", \"Name\", \"Action\", \"ActionDescription\"}."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch paths and print change events
    #[command(about = "Watch paths and print one JSON change event per line until interrupted")]
    Watch(WatchArgs),

    /// Show what a watch list expands to
    #[command(about = "Expand wildcards and print the resulting watch targets")]
    Expand(ExpandArgs),
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Paths or wildcard patterns to watch (overrides the config file's list)
    #[arg(help = "Files, directories or '<dir>*.<ext>' patterns to watch")]
    pub paths: Vec<PathBuf>,

    /// Watch directories recursively
    #[arg(short, long, help = "Watch the given directories and all their subdirectories")]
    pub recursive: bool,

    /// Capacity of the internal dispatch queue
    #[arg(long, help = "Events buffered before new ones are dropped")]
    pub queue_size: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct ExpandArgs {
    /// Paths or wildcard patterns to expand (overrides the config file's list)
    #[arg(help = "Files, directories or '<dir>*.<ext>' patterns to expand")]
    pub paths: Vec<PathBuf>,

    /// Mark the given paths as recursive
    #[arg(short, long)]
    pub recursive: bool,

    /// Output the prepared list as JSON
    #[arg(long)]
    pub json: bool,
}
