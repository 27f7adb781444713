use crate::cli::app::ExpandArgs;
use anyhow::{Result, bail};
use argus_core::monitor::prepare_watch_list;
use std::path::PathBuf;

pub fn execute(args: ExpandArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::resolve_config(config_path.as_deref(), &args.paths, args.recursive)?;
    if config.watch.is_empty() {
        bail!("Nothing to expand: pass paths or a config file with [[watch]] entries");
    }

    let targets = prepare_watch_list(&config.watch);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else {
        for target in &targets {
            println!("{}", target);
        }
    }

    Ok(())
}
