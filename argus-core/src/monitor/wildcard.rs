//! Expansion of `<dir>*.<ext>` watch specifications into concrete files

use crate::WatchError;
use crate::monitor::WatchTarget;
use regex_utils::wildcard;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Outcome of testing a path specification for a wildcard
#[derive(Debug)]
pub enum Expansion {
    /// The specification is a plain path
    NotWildcard,
    /// Concrete, non-recursive targets in walk order
    Expanded(Vec<WatchTarget>),
    /// The walk failed; no partial list is returned
    Failed(WatchError),
}

/// Expand a wildcard specification
///
/// The whole subtree below the directory prefix is searched, so
/// `/logs/*.log` also picks up `/logs/archive/old.log`.
pub fn expand_wildcard(spec: &Path) -> Expansion {
    let spec_str = spec.to_string_lossy();
    let Some(parsed) = wildcard::parse(&spec_str) else {
        return Expansion::NotWildcard;
    };

    let dir = if parsed.dir.is_empty() { PathBuf::from(".") } else { PathBuf::from(&parsed.dir) };

    let matcher = match wildcard::file_name_matcher(&parsed.ext) {
        Ok(matcher) => matcher,
        Err(e) => {
            // ext is \w+ and escaped
            warn!("Invalid wildcard extension in {:?}: {}", spec, e);
            return Expansion::NotWildcard;
        }
    };

    let mut matched = Vec::new();
    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                let path = source.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                let err = WatchError::Walk { path, source };
                warn!("Wildcard expansion of {:?} aborted: {}", spec, err);
                return Expansion::Failed(err);
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        if matcher.is_match(&entry.file_name().to_string_lossy()) {
            matched.push(WatchTarget::new(entry.into_path(), false));
        }
    }

    debug!("Expanded {:?} into {} target(s)", spec, matched.len());
    Expansion::Expanded(matched)
}
