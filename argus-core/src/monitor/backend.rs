//! Notification backend seam and its implementation on the notify crate

use crate::monitor::{Op, RawEvent};
use crate::{Result, WatchError};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::trace;

/// Anything that can be asked to report changes on a path
///
/// Registration is always non-recursive: registering a directory covers
/// its direct children, deeper levels need their own registration.
pub trait WatchBackend: Send {
    fn add(&mut self, path: &Path) -> Result<()>;

    /// Stop reporting changes on a previously added path
    fn remove(&mut self, path: &Path) -> Result<()>;
}

/// Receiving half of a backend's raw output
pub struct RawSource {
    pub events: mpsc::UnboundedReceiver<RawEvent>,
    pub errors: mpsc::UnboundedReceiver<WatchError>,
}

/// Sending half of a backend's raw output
#[derive(Clone)]
pub struct RawSink {
    events: mpsc::UnboundedSender<RawEvent>,
    errors: mpsc::UnboundedSender<WatchError>,
}

impl RawSink {
    /// Returns false once the receiving side is gone
    pub fn send_event(&self, event: RawEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn send_error(&self, error: WatchError) -> bool {
        self.errors.send(error).is_ok()
    }
}

/// Create a connected sink/source pair
pub fn raw_channel() -> (RawSink, RawSource) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    (
        RawSink { events: events_tx, errors: errors_tx },
        RawSource { events: events_rx, errors: errors_rx },
    )
}

/// Backend over the platform's recommended notify watcher
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl NotifyBackend {
    /// Create the OS watcher and the source its notifications arrive on
    pub fn new() -> Result<(Self, RawSource)> {
        let (sink, source) = raw_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for raw in raw_events(event) {
                    if !sink.send_event(raw) {
                        return;
                    }
                }
            }
            Err(e) => {
                sink.send_error(WatchError::Primitive(e));
            }
        })?;

        Ok((Self { watcher }, source))
    }
}

impl WatchBackend for NotifyBackend {
    fn add(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Registration { path: path.to_path_buf(), source })
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.watcher.unwatch(path)?;
        Ok(())
    }
}

/// Translate a notify event into raw bitmask notifications, one per path
///
/// Renames follow the from/to convention: the old name reports a rename,
/// the new name reports a creation. The combined `Both` event repeats
/// what `From` and `To` already reported and is dropped.
pub fn raw_events(event: Event) -> Vec<RawEvent> {
    let op = match event.kind {
        EventKind::Create(_) => Op::CREATE,
        EventKind::Remove(_) => Op::REMOVE,
        EventKind::Modify(ModifyKind::Metadata(_)) => Op::CHMOD,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Op::CREATE,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Op::empty(),
        EventKind::Modify(ModifyKind::Name(_)) => Op::RENAME,
        EventKind::Modify(_) => Op::WRITE,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Op::empty(),
    };

    if op.is_empty() {
        trace!("Ignoring notify event {:?}", event.kind);
        return Vec::new();
    }

    event.paths.into_iter().map(|path| RawEvent::new(path, op)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::path::PathBuf;

    fn ops_for(kind: EventKind) -> Vec<Op> {
        let event = Event::new(kind).add_path(PathBuf::from("/w/file"));
        raw_events(event).into_iter().map(|raw| raw.op).collect()
    }

    #[test]
    fn test_notify_kinds_map_to_bits() {
        assert_eq!(ops_for(EventKind::Create(CreateKind::File)), vec![Op::CREATE]);
        assert_eq!(
            ops_for(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            vec![Op::WRITE]
        );
        assert_eq!(ops_for(EventKind::Modify(ModifyKind::Any)), vec![Op::WRITE]);
        assert_eq!(
            ops_for(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            vec![Op::CHMOD]
        );
        assert_eq!(ops_for(EventKind::Remove(RemoveKind::File)), vec![Op::REMOVE]);
    }

    #[test]
    fn test_renames() {
        assert_eq!(
            ops_for(EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            vec![Op::RENAME]
        );
        assert_eq!(ops_for(EventKind::Modify(ModifyKind::Name(RenameMode::Any))), vec![Op::RENAME]);
        assert_eq!(ops_for(EventKind::Modify(ModifyKind::Name(RenameMode::To))), vec![Op::CREATE]);
        assert!(ops_for(EventKind::Modify(ModifyKind::Name(RenameMode::Both))).is_empty());
    }

    #[test]
    fn test_access_is_ignored() {
        assert!(ops_for(EventKind::Access(AccessKind::Any)).is_empty());
        assert!(ops_for(EventKind::Other).is_empty());
    }

    #[test]
    fn test_one_raw_event_per_path() {
        let event = Event::new(EventKind::Remove(RemoveKind::Any))
            .add_path(PathBuf::from("/w/a"))
            .add_path(PathBuf::from("/w/b"));

        let raws = raw_events(event);
        assert_eq!(
            raws,
            vec![RawEvent::new("/w/a", Op::REMOVE), RawEvent::new("/w/b", Op::REMOVE)]
        );
    }

    #[tokio::test]
    async fn test_raw_channel_delivers() {
        let (sink, mut source) = raw_channel();
        assert!(sink.send_event(RawEvent::new("/w/a", Op::WRITE)));
        assert!(sink.send_error(WatchError::Primitive(notify::Error::generic("boom"))));

        assert_eq!(source.events.recv().await, Some(RawEvent::new("/w/a", Op::WRITE)));
        assert!(matches!(source.errors.recv().await, Some(WatchError::Primitive(_))));

        drop(source);
        assert!(!sink.send_event(RawEvent::new("/w/b", Op::WRITE)));
    }
}
