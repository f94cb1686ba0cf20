//! Background analysis sessions.
//!
//! A [`Session`] owns a worker thread that reparses the document as edits
//! arrive. Edits are debounced over a quiescence window, a reparse in
//! flight is abandoned as soon as a newer edit supersedes it, and results
//! are published as immutable [`Snapshot`]s; a stale parse is never
//! published. All handoff is message passing of owned values; the worker
//! shares nothing mutable with the caller except the published snapshot
//! cell.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cavern_core::document::Document;
use cavern_parser::error::{Diagnostic, DiagnosticCollector};

use crate::AnalyzerConfig;

/// An immutable, versioned analysis result.
#[derive(Debug)]
pub struct Snapshot {
    /// The version of the edit this snapshot was produced from.
    pub version: u64,
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

enum Msg {
    Edit { version: u64, text: String },
    Shutdown,
}

struct Shared {
    /// Version of the most recently submitted edit. The worker compares
    /// against it between pipeline phases to abandon stale work.
    latest_version: AtomicU64,
    cell: Mutex<Option<Arc<Snapshot>>>,
    published: Condvar,
}

/// A debounced background analysis session.
pub struct Session {
    tx: mpsc::Sender<Msg>,
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Session {
    /// Spawn a session with the given debounce window.
    pub fn spawn(config: AnalyzerConfig, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            latest_version: AtomicU64::new(0),
            cell: Mutex::new(None),
            published: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("cavern-session".to_string())
            .spawn(move || worker_loop(rx, worker_shared, config, debounce))
            .expect("failed to spawn session worker");

        Self {
            tx,
            shared,
            worker: Some(worker),
        }
    }

    /// Submit a new text snapshot; returns its version. Any reparse of an
    /// older version still in flight is abandoned.
    pub fn submit(&self, text: impl Into<String>) -> u64 {
        let version = self.shared.latest_version.fetch_add(1, Ordering::SeqCst) + 1;
        // A send only fails when the worker is gone, which Drop arranges.
        let _ = self.tx.send(Msg::Edit {
            version,
            text: text.into(),
        });
        version
    }

    /// The most recently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.cell.lock().expect("session cell poisoned").clone()
    }

    /// Block until a snapshot at or past `version` is published, or the
    /// timeout elapses.
    pub fn wait_for(&self, version: u64, timeout: Duration) -> Option<Arc<Snapshot>> {
        let deadline = Instant::now() + timeout;
        let mut cell = self.shared.cell.lock().expect("session cell poisoned");
        loop {
            if let Some(snapshot) = cell.as_ref() {
                if snapshot.version >= version {
                    return Some(Arc::clone(snapshot));
                }
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (next, timed_out) = self
                .shared
                .published
                .wait_timeout(cell, remaining)
                .expect("session cell poisoned");
            cell = next;
            if timed_out.timed_out() {
                // A snapshot may have landed between the timeout and the
                // lock reacquisition.
                return cell
                    .as_ref()
                    .filter(|s| s.version >= version)
                    .map(Arc::clone);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    rx: mpsc::Receiver<Msg>,
    shared: Arc<Shared>,
    config: AnalyzerConfig,
    debounce: Duration,
) {
    let options = config.validate_options();

    while let Ok(msg) = rx.recv() {
        let (mut version, mut text) = match msg {
            Msg::Edit { version, text } => (version, text),
            Msg::Shutdown => return,
        };

        // Quiescence window: keep absorbing edits until the stream goes
        // quiet for one debounce interval.
        loop {
            match rx.recv_timeout(debounce) {
                Ok(Msg::Edit {
                    version: newer,
                    text: newer_text,
                }) => {
                    version = newer;
                    text = newer_text;
                }
                Ok(Msg::Shutdown) => return,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let stale = || shared.latest_version.load(Ordering::SeqCst) != version;
        if stale() {
            continue;
        }

        let outcome = cavern_parser::parse(&text);
        if stale() {
            log::debug!(version; "parse abandoned, newer edit pending");
            continue;
        }

        let validation = cavern_parser::validate(&outcome.document, &options);
        if stale() {
            log::debug!(version; "validation abandoned, newer edit pending");
            continue;
        }

        let mut collector = DiagnosticCollector::new();
        collector.extend(outcome.diagnostics);
        collector.extend(validation);

        let snapshot = Arc::new(Snapshot {
            version,
            document: outcome.document,
            diagnostics: collector.finish(),
        });

        let mut cell = shared.cell.lock().expect("session cell poisoned");
        // One writer: the version check above makes regression impossible,
        // but the invariant is cheap to state.
        if cell.as_ref().is_none_or(|s| s.version < snapshot.version) {
            *cell = Some(snapshot);
            shared.published.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::spawn(AnalyzerConfig::default(), Duration::from_millis(10))
    }

    #[test]
    fn publishes_a_snapshot_for_a_submitted_edit() {
        let session = session();
        let version = session.submit("tiles{\n1,1,\n}\n");
        let snapshot = session
            .wait_for(version, Duration::from_secs(5))
            .expect("snapshot published");
        assert_eq!(snapshot.version, version);
        assert_eq!(snapshot.document.sections().len(), 1);
    }

    #[test]
    fn rapid_edits_coalesce_to_the_newest() {
        let session = session();
        session.submit("tiles{\n1,\n}\n");
        session.submit("tiles{\n1,1,\n}\n");
        let last = session.submit("tiles{\n1,1,1,\n}\n");

        let snapshot = session
            .wait_for(last, Duration::from_secs(5))
            .expect("snapshot published");
        assert_eq!(snapshot.version, last);
        use cavern_core::document::SectionKind;
        assert_eq!(snapshot.document.grid(SectionKind::Tiles).unwrap().width(), 3);
    }

    #[test]
    fn published_versions_never_regress() {
        let session = session();
        let first = session.submit("tiles{\n1,\n}\n");
        session
            .wait_for(first, Duration::from_secs(5))
            .expect("first snapshot");
        let second = session.submit("tiles{\n2,\n}\n");
        let snapshot = session
            .wait_for(second, Duration::from_secs(5))
            .expect("second snapshot");
        assert!(snapshot.version >= second);
    }

    #[test]
    fn snapshot_is_none_before_any_edit() {
        let session = session();
        assert!(session.snapshot().is_none());
    }
}
