//! Configuration for watch sessions
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! dispatch_queue_size = 1024
//! follow_new_directories = true
//!
//! [[watch]]
//! path = "/var/log/*.log"
//!
//! [[watch]]
//! path = "/srv/data"
//! recursive = true
//! ```

use crate::monitor::WatchTarget;
use crate::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default capacity of the internal dispatch queue
pub const DEFAULT_DISPATCH_QUEUE_SIZE: usize = 1024;

/// Main configuration for a watch session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Paths to watch, wildcards allowed
    pub watch: Vec<WatchTarget>,

    /// Events buffered between classification and publication
    pub dispatch_queue_size: usize,

    /// Register directories created under a recursive target while running
    pub follow_new_directories: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch: Vec::new(),
            dispatch_queue_size: DEFAULT_DISPATCH_QUEUE_SIZE,
            follow_new_directories: true,
        }
    }
}

impl WatchConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse configuration text; `origin` is only used in errors
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| WatchError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.dispatch_queue_size == 0 {
            return Err(WatchError::Config {
                path: origin.to_path_buf(),
                message: "dispatch_queue_size must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Replace the configured watch list
    pub fn with_targets(mut self, targets: Vec<WatchTarget>) -> Self {
        self.watch = targets;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const EXAMPLE_CONFIG: &str = r#"
dispatch_queue_size = 64

[[watch]]
path = "/var/log/*.log"

[[watch]]
path = "/srv/data"
recursive = true
"#;

    #[test]
    fn test_parse_example() {
        let config = WatchConfig::parse(EXAMPLE_CONFIG, Path::new("argus.toml")).unwrap();

        assert_eq!(config.dispatch_queue_size, 64);
        assert!(config.follow_new_directories);
        assert_eq!(
            config.watch,
            vec![WatchTarget::new("/var/log/*.log", false), WatchTarget::new("/srv/data", true)]
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WatchConfig::parse("", Path::new("argus.toml")).unwrap();
        assert_eq!(config, WatchConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = WatchConfig::parse("watch = 5", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(
            err,
            WatchError::Config { ref path, .. } if path == &PathBuf::from("bad.toml")
        ));

        let err = WatchConfig::parse("dispatch_queue_size = 0", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("dispatch_queue_size"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("argus.toml");
        std::fs::write(&path, EXAMPLE_CONFIG).unwrap();

        let config = WatchConfig::load(&path).unwrap();
        assert_eq!(config.watch.len(), 2);

        let missing = WatchConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, WatchError::Io(_)));
    }
}
