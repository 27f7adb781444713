pub mod expand;
pub mod watch;

use anyhow::{Context, Result};
use argus_core::{WatchConfig, WatchTarget};
use std::path::{Path, PathBuf};

/// Build the session configuration from an optional file and the command line
///
/// Paths given on the command line replace the file's watch list.
pub(crate) fn resolve_config(
    config_path: Option<&Path>,
    paths: &[PathBuf],
    recursive: bool,
) -> Result<WatchConfig> {
    let config = match config_path {
        Some(path) => WatchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => WatchConfig::default(),
    };

    if paths.is_empty() {
        return Ok(config);
    }

    let targets = paths.iter().map(|p| WatchTarget::new(p, recursive)).collect();
    Ok(config.with_targets(targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_paths_override_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("argus.toml");
        std::fs::write(&file, "dispatch_queue_size = 8\n[[watch]]\npath = \"/etc\"\n").unwrap();

        let config = resolve_config(Some(&file), &[PathBuf::from("/tmp/*.log")], true).unwrap();
        assert_eq!(config.dispatch_queue_size, 8);
        assert_eq!(config.watch, vec![WatchTarget::new("/tmp/*.log", true)]);

        let config = resolve_config(Some(&file), &[], false).unwrap();
        assert_eq!(config.watch, vec![WatchTarget::new("/etc", false)]);
    }

    #[test]
    fn test_missing_config_file() {
        let err = resolve_config(Some(Path::new("/nonexistent/argus.toml")), &[], false);
        assert!(err.is_err());
    }
}
