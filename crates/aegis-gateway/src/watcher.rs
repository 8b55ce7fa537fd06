//! Filesystem watcher that hot-reloads the policy store.
//!
//! Watches the policy directory (non-recursively) and triggers a reload on
//! create, write, remove, and rename events. Bursts of events within 50 ms
//! are coalesced into one reload so editor save patterns do not thrash the
//! store. The loop survives watcher errors and failed reloads; only closure
//! of the watcher channel ends it.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use aegis_policy::PolicyStore;
use aegis_types::AegisError;

/// Window within which change events are coalesced into one reload.
const DEBOUNCE: Duration = Duration::from_millis(50);

/// Watches the store's policy directory and reloads it on change.
pub struct PolicyWatcher {
    // Dropping the watcher closes the event channel, which ends the loop.
    watcher: Option<RecommendedWatcher>,
    handle: Option<JoinHandle<()>>,
}

impl PolicyWatcher {
    /// Start watching `store`'s policy directory.
    pub fn start(store: Arc<PolicyStore>) -> Result<Self, AegisError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |event: Result<notify::Event, notify::Error>| {
                let _ = tx.send(event);
            },
            Config::default(),
        )
        .map_err(|e| AegisError::GatewayError(format!("failed to create file watcher: {e}")))?;

        watcher
            .watch(store.dir(), RecursiveMode::NonRecursive)
            .map_err(|e| {
                AegisError::GatewayError(format!("failed to watch policy directory: {e}"))
            })?;

        info!(dir = %store.dir().display(), "watching policy directory");

        let handle = std::thread::Builder::new()
            .name("policy-watcher".into())
            .spawn(move || watch_loop(rx, store))
            .map_err(|e| {
                AegisError::GatewayError(format!("failed to spawn watcher thread: {e}"))
            })?;

        Ok(Self {
            watcher: Some(watcher),
            handle: Some(handle),
        })
    }

    /// Stop the watcher and wait for the loop to exit.
    pub fn stop(mut self) {
        // Dropping the notify watcher disconnects the channel.
        self.watcher.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn watch_loop(rx: Receiver<Result<notify::Event, notify::Error>>, store: Arc<PolicyStore>) {
    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => return,
        };
        match event {
            Err(e) => {
                warn!(error = %e, "policy watcher error");
                continue;
            }
            Ok(event) => {
                if !is_reload_trigger(&event.kind) {
                    continue;
                }
                debug!(paths = ?event.paths, kind = ?event.kind, "policy change detected");
            }
        }

        // Coalesce the burst of events an editor save emits.
        let mut disconnected = false;
        loop {
            match rx.recv_timeout(DEBOUNCE) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        match store.reload() {
            Ok(()) => info!("policies reloaded"),
            Err(e) => warn!(error = %e, "failed to reload policies"),
        }

        if disconnected {
            return;
        }
    }
}

/// Whether an event kind should trigger a reload.
///
/// `Modify` covers both data writes and renames; removes matter so stale
/// entries get dropped from the aggregate.
fn is_reload_trigger(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
