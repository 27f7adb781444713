//! Filesystem monitoring and change normalization
//!
//! This module turns raw notifications from the OS watcher into a
//! uniform stream of JSON-encoded change events:
//! - Wildcard expansion of `<dir>*.<ext>` watch specifications
//! - Recursive registration of directory trees
//! - Classification of raw operation bitmasks into a closed action set
//! - Ordered, non-blocking dispatch onto an outbound channel

pub mod backend;
pub mod classifier;
pub mod prepare;
pub mod queue;
pub mod registrar;
pub mod watcher;
pub mod wildcard;


pub use backend::{NotifyBackend, RawSink, RawSource, WatchBackend};
pub use classifier::{Op, RawEvent, classify};
pub use prepare::prepare_watch_list;
pub use queue::{DispatchQueue, DispatchStats, StatsSnapshot};
pub use registrar::{Registrar, RegistrationReport, TreeWalk};
pub use watcher::WatchSession;
pub use wildcard::{Expansion, expand_wildcard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One caller intent to watch a filesystem path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchTarget {
    pub path: PathBuf,
    #[serde(default)]
    pub recursive: bool,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self { path: path.into(), recursive }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recursive {
            write!(f, "{} (recursive)", self.path.display())
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}

/// Classification of a raw operation bitmask
///
/// Encoded on the wire as a small integer; the mapping is fixed and
/// consumers may depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Action {
    Create = 0,
    Write = 1,
    Delete = 2,
    Rename = 3,
    PermissionChange = 4,
}

impl Action {
    /// Human-readable description of this action on `path`
    pub fn describe(self, path: &Path) -> String {
        let path = path.display();
        match self {
            Action::Create => format!("File created: {}", path),
            Action::Write => format!("File modified: {}", path),
            Action::Delete => format!("File removed: {}", path),
            Action::Rename => format!("File renamed: {}", path),
            Action::PermissionChange => format!("File permissions modified: {}", path),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        action as u8
    }
}

impl TryFrom<u8> for Action {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Create),
            1 => Ok(Action::Write),
            2 => Ok(Action::Delete),
            3 => Ok(Action::Rename),
            4 => Ok(Action::PermissionChange),
            other => Err(format!("unknown action code {}", other)),
        }
    }
}

/// A normalized filesystem change, as published to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Name")]
    pub path: PathBuf,
    #[serde(rename = "Action")]
    pub action: Action,
    #[serde(rename = "ActionDescription")]
    pub description: String,
}

impl ChangeEvent {
    /// Encode for the outbound channel
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|source| crate::WatchError::Encoding {
            path: self.path.clone(),
            source,
        })
    }

    /// Decode an event received from the outbound channel
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
