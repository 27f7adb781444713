//! Watch sessions: registration followed by the long-running receive loop

use crate::config::WatchConfig;
use crate::monitor::{
    DispatchQueue, DispatchStats, NotifyBackend, Op, RawEvent, RawSource, Registrar,
    RegistrationReport, StatsSnapshot, WatchBackend, classify, prepare_watch_list,
};
use crate::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Handle to a running watch session
///
/// Dropping the session stops watching; [`WatchSession::shutdown`] does the
/// same but waits until every classified event has been published.
pub struct WatchSession {
    events: Option<mpsc::UnboundedReceiver<String>>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
    stats: Arc<DispatchStats>,
    registration: RegistrationReport,
}

impl WatchSession {
    /// Start watching the configured paths with the platform watcher
    pub async fn start(config: &WatchConfig) -> Result<Self> {
        let (backend, source) = NotifyBackend::new()?;
        Ok(Self::start_with_backend(backend, source, config).await)
    }

    /// Start watching with an explicit backend and its raw source
    ///
    /// Wildcards are expanded and every target is registered before this
    /// returns; registration failures are logged and kept in
    /// [`WatchSession::registration`].
    pub async fn start_with_backend<B: WatchBackend + 'static>(
        mut backend: B,
        source: RawSource,
        config: &WatchConfig,
    ) -> Self {
        let targets = prepare_watch_list(&config.watch);
        let mut registrar = Registrar::new();
        let registration = registrar.register_all(&mut backend, &targets);

        let recursive_roots =
            targets.iter().filter(|t| t.recursive).map(|t| t.path.clone()).collect();

        let stats = Arc::new(DispatchStats::default());
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (queue, sequencer) =
            DispatchQueue::start(config.dispatch_queue_size, out_tx, stats.clone());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let receiver = ReceiveLoop {
            backend,
            registrar,
            recursive_roots,
            follow_new_directories: config.follow_new_directories,
            queue,
            stats: stats.clone(),
        };

        let task = tokio::spawn(async move {
            receiver.run(source, shutdown_rx).await;
            if let Err(e) = sequencer.await {
                error!("Dispatch sequencer failed: {}", e);
            }
        });

        info!("Watch session started with {} target(s)", targets.len());

        Self { events: Some(out_rx), shutdown_tx, task, stats, registration }
    }

    /// Next JSON-encoded event, or `None` once the session has stopped
    /// (or the stream was taken)
    pub async fn recv(&mut self) -> Option<String> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    /// Take the outbound stream, e.g. to hand it to another task
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.events.take()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Outcome of the initial registration pass
    pub fn registration(&self) -> &RegistrationReport {
        &self.registration
    }

    /// Stop the receive loop, release the watcher and flush queued events
    pub async fn shutdown(self) -> StatsSnapshot {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Receive loop already stopped");
        }

        if let Err(e) = self.task.await {
            error!("Receive loop failed: {}", e);
        }

        let stats = self.stats.snapshot();
        info!(
            "Watch session stopped: {} published, {} dropped, {} failed, {} watch error(s)",
            stats.published, stats.dropped, stats.failed, stats.primitive_errors
        );
        stats
    }
}

struct ReceiveLoop<B> {
    backend: B,
    registrar: Registrar,
    recursive_roots: Vec<PathBuf>,
    follow_new_directories: bool,
    queue: DispatchQueue,
    stats: Arc<DispatchStats>,
}

impl<B: WatchBackend> ReceiveLoop<B> {
    async fn run(mut self, mut source: RawSource, mut shutdown_rx: mpsc::Receiver<()>) {
        debug!("Receive loop running");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                err = source.errors.recv() => match err {
                    Some(err) => {
                        warn!("{}", err);
                        self.stats.record_primitive_error();
                    }
                    None => {
                        debug!("Raw error source closed");
                        break;
                    }
                },
                raw = source.events.recv() => match raw {
                    Some(raw) => self.handle_event(raw).await,
                    None => {
                        debug!("Raw event source closed");
                        break;
                    }
                },
            }
        }

        debug!("Receive loop stopped");
    }

    async fn handle_event(&mut self, raw: RawEvent) {
        trace!("Raw event {:?} on {:?}", raw.op, raw.path);

        if let Some(event) = classify(&raw, Utc::now()) {
            self.queue.enqueue(event);
        }

        // a rename's old name is gone, unless it was reused already
        let gone = raw.op.contains(Op::REMOVE)
            || (raw.op.contains(Op::RENAME) && !raw.path.exists());
        if gone {
            self.registrar.forget(&mut self.backend, &raw.path);
        }

        if self.follow_new_directories && raw.op.contains(Op::CREATE) {
            self.follow_directory(&raw.path).await;
        }
    }

    /// Register a directory created below a recursive target
    ///
    /// The tree is walked on the blocking pool; only the registrations
    /// themselves happen on the loop.
    async fn follow_directory(&mut self, path: &Path) {
        if !path.is_dir() || self.registrar.is_registered(path) {
            return;
        }
        if !self.recursive_roots.iter().any(|root| path.starts_with(root)) {
            return;
        }

        let root = path.to_path_buf();
        let walk = match tokio::task::spawn_blocking(move || Registrar::walk_tree(&root)).await {
            Ok(walk) => walk,
            Err(e) => {
                error!("Walking new directory {:?} failed: {}", path, e);
                return;
            }
        };

        let report = self.registrar.register_walk(&mut self.backend, walk);
        info!(
            "Following new directory {:?}: {} path(s) registered, {} failure(s)",
            path,
            report.registered.len(),
            report.failures.len()
        );
    }
}
