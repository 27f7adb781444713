//! Registration of prepared watch targets with a backend

use crate::WatchError;
use crate::monitor::{WatchBackend, WatchTarget};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What a registration pass did
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Paths handed to the backend successfully, in registration order
    pub registered: Vec<PathBuf>,
    /// Entries that were skipped
    pub failures: Vec<WatchError>,
}

impl RegistrationReport {
    fn merge(&mut self, other: RegistrationReport) {
        self.registered.extend(other.registered);
        self.failures.extend(other.failures);
    }
}

/// Entries of a directory tree, collected before registration
#[derive(Debug, Default)]
pub struct TreeWalk {
    /// `(path, is_dir)` in walk order, parents before children
    entries: Vec<(PathBuf, bool)>,
    failures: Vec<WatchError>,
}

/// Registers targets with a backend, walking recursive ones
#[derive(Debug, Default)]
pub struct Registrar {
    /// Directories currently registered
    dirs: HashSet<PathBuf>,
    /// Plain files registered on their own
    files: HashSet<PathBuf>,
}

impl Registrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` is currently registered
    pub fn is_registered(&self, path: &Path) -> bool {
        self.dirs.contains(path) || self.files.contains(path)
    }

    /// Register every prepared target
    ///
    /// Failures never abort the pass; they are logged and collected.
    /// Files end up registered only when no registered directory reports
    /// them already, whatever the target order.
    pub fn register_all<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        targets: &[WatchTarget],
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for target in targets {
            if target.recursive {
                report.merge(self.register_tree(backend, &target.path));
                continue;
            }

            let covered_file = !target.path.is_dir() && self.is_covered(&target.path);
            if covered_file || self.is_registered(&target.path) {
                debug!("Already watched: {}", target);
                continue;
            }

            match self.register_path(backend, &target.path) {
                Ok(()) => report.registered.push(target.path.clone()),
                Err(err) => {
                    warn!("Skipping watch target {}: {}", target, err);
                    report.failures.push(err);
                }
            }
        }

        self.prune_covered_files(backend, &mut report);

        info!(
            "Registered {} path(s) for {} target(s), {} failure(s)",
            report.registered.len(),
            targets.len(),
            report.failures.len()
        );
        report
    }

    /// Register a directory tree rooted at `root`
    pub fn register_tree<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        root: &Path,
    ) -> RegistrationReport {
        self.register_walk(backend, Self::walk_tree(root))
    }

    /// Collect the entries below `root` without touching any backend
    ///
    /// A failing entry is recorded and the walk continues with its
    /// siblings.
    pub fn walk_tree(root: &Path) -> TreeWalk {
        let mut walk = TreeWalk::default();

        if !root.exists() {
            walk.failures.push(WatchError::PathNotFound { path: root.to_path_buf() });
            return walk;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) => {
                    let is_dir = entry.file_type().is_dir();
                    walk.entries.push((entry.into_path(), is_dir));
                }
                Err(source) => {
                    let path =
                        source.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    walk.failures.push(WatchError::Walk { path, source });
                }
            }
        }

        walk
    }

    /// Register the entries of a finished walk
    ///
    /// Every directory is registered; a plain file only when its parent
    /// directory is not registered, since a directory registration
    /// already reports changes to its direct children.
    pub fn register_walk<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        walk: TreeWalk,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for err in walk.failures {
            warn!("Skipping entry: {}", err);
            report.failures.push(err);
        }

        for (path, is_dir) in walk.entries {
            if self.is_registered(&path) {
                debug!("Already registered: {:?}", path);
                continue;
            }
            if !is_dir && self.is_covered(&path) {
                continue;
            }

            match self.register_path(backend, &path) {
                Ok(()) => report.registered.push(path),
                Err(err) => {
                    warn!("Skipping entry: {}", err);
                    report.failures.push(err);
                }
            }
        }

        report
    }

    /// Drop `path` and everything registered below it
    ///
    /// Called once a path has disappeared, so that a directory created
    /// again under the same name is registered afresh. Returns the
    /// evicted paths.
    pub fn forget<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: &Path,
    ) -> Vec<PathBuf> {
        let mut evicted: Vec<PathBuf> = self
            .dirs
            .iter()
            .chain(self.files.iter())
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        evicted.sort();

        for p in &evicted {
            self.dirs.remove(p);
            self.files.remove(p);
            // the OS usually dropped the watch already
            if let Err(e) = backend.remove(p) {
                debug!("Releasing watch on {:?}: {}", p, e);
            }
        }

        if !evicted.is_empty() {
            debug!("Forgot {} watch(es) under {:?}", evicted.len(), path);
        }
        evicted
    }

    fn register_path<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: &Path,
    ) -> Result<(), WatchError> {
        if !path.exists() {
            return Err(WatchError::PathNotFound { path: path.to_path_buf() });
        }

        backend.add(path)?;
        debug!("Watching {:?}", path);

        if path.is_dir() {
            self.dirs.insert(path.to_path_buf());
        } else {
            self.files.insert(path.to_path_buf());
        }
        Ok(())
    }

    /// Release file watches that a directory registered later covers
    fn prune_covered_files<B: WatchBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        report: &mut RegistrationReport,
    ) {
        let redundant: Vec<PathBuf> =
            self.files.iter().filter(|f| self.is_covered(f)).cloned().collect();

        for file in &redundant {
            self.files.remove(file);
            if let Err(e) = backend.remove(file) {
                warn!("Failed to release redundant watch on {:?}: {}", file, e);
            }
        }

        report.registered.retain(|p| !redundant.contains(p));
    }

    fn is_covered(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| self.dirs.contains(parent))
    }
}
