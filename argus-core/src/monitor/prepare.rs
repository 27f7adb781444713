//! Watch list preparation

use crate::monitor::{Expansion, WatchTarget, expand_wildcard};
use tracing::debug;

/// Flatten a watch list, replacing wildcard specifications by the files
/// they expand to
///
/// Order across specifications is preserved. A specification whose
/// expansion failed is passed through unchanged so that registration
/// reports it.
pub fn prepare_watch_list(watch_list: &[WatchTarget]) -> Vec<WatchTarget> {
    let mut out = Vec::with_capacity(watch_list.len());

    for target in watch_list {
        match expand_wildcard(&target.path) {
            Expansion::Expanded(list) => out.extend(list),
            Expansion::NotWildcard => out.push(target.clone()),
            Expansion::Failed(err) => {
                debug!("Keeping unexpanded spec {} after error: {}", target, err);
                out.push(target.clone());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_plain_targets_pass_through_in_order() {
        let list = vec![
            WatchTarget::new("/srv/b", true),
            WatchTarget::new("/srv/a.txt", false),
            WatchTarget::new("relative/dir", true),
        ];

        assert_eq!(prepare_watch_list(&list), list);
    }

    #[test]
    fn test_wildcards_are_flattened_in_place() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.log"), "").unwrap();
        fs::write(dir.path().join("b.log"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let list = vec![
            WatchTarget::new("/before", true),
            WatchTarget::new(format!("{}/*.log", dir.path().display()), true),
            WatchTarget::new("/after", false),
        ];

        let prepared = prepare_watch_list(&list);
        assert_eq!(
            prepared,
            vec![
                WatchTarget::new("/before", true),
                WatchTarget::new(dir.path().join("a.log"), false),
                WatchTarget::new(dir.path().join("b.log"), false),
                WatchTarget::new("/after", false),
            ]
        );
    }

    #[test]
    fn test_failed_expansion_keeps_spec() {
        let spec = WatchTarget::new("/definitely/not/here/*.log", false);
        let prepared = prepare_watch_list(std::slice::from_ref(&spec));
        assert_eq!(prepared, vec![spec]);
        assert_eq!(prepared[0].path, PathBuf::from("/definitely/not/here/*.log"));
    }
}
