//! Policy store with atomic hot-reload under concurrent readers.
//!
//! The published [`PolicyModel`] is an immutable aggregate behind an
//! `Arc`. Readers clone the `Arc` under a read lock, so read cost is
//! constant in the number of concurrent evaluators and a request observes
//! exactly one snapshot for its whole lifetime. Reload builds the new
//! aggregate off to the side (no lock held across file I/O) and publishes it
//! with a single swap; a separate mutex serializes overlapping reloads.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use aegis_types::AegisError;

use crate::schema::{Policy, PolicyModel};

/// Filename suffix for policy documents. Everything else is ignored.
const POLICY_SUFFIX: &str = ".yaml";

/// Owns the current [`PolicyModel`] and its source directory.
pub struct PolicyStore {
    dir: PathBuf,
    current: RwLock<Arc<PolicyModel>>,
    reload_lock: Mutex<()>,
}

impl PolicyStore {
    /// Create a store by loading all policies from `dir`.
    ///
    /// An unreadable directory is fatal here; individual files that fail to
    /// parse or validate are skipped with a warning, exactly as on reload.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AegisError> {
        let dir = dir.into();
        let model = load_dir(&dir)?;
        Ok(Self {
            dir,
            current: RwLock::new(Arc::new(model)),
            reload_lock: Mutex::new(()),
        })
    }

    /// The policy directory this store loads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the currently published snapshot.
    ///
    /// The returned `Arc` keeps that snapshot alive for as long as the caller
    /// holds it, independent of any concurrent reload.
    pub fn snapshot(&self) -> Arc<PolicyModel> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Rebuild the aggregate from disk and publish it atomically.
    ///
    /// Returns an error (leaving the previous snapshot in place) only when
    /// the directory itself cannot be enumerated. Per-file failures skip that
    /// file: the new aggregate contains whatever parsed and validated.
    pub fn reload(&self) -> Result<(), AegisError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        let model = load_dir(&self.dir)?;
        let count = model.len();
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(model);
        debug!(policies = count, "published new policy snapshot");
        Ok(())
    }
}

/// Enumerate `dir` (non-recursively) and build a fresh aggregate from every
/// `.yaml` file that parses and validates.
fn load_dir(dir: &Path) -> Result<PolicyModel, AegisError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AegisError::PolicyError(format!("failed to read policy directory: {e}")))?;

    let mut model = PolicyModel::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "failed to read policy directory entry, skipping");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if path.is_dir() || !name.ends_with(POLICY_SUFFIX) {
            continue;
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %name, error = %e, "failed to read policy file, skipping");
                continue;
            }
        };
        let policy: Policy = match serde_yaml::from_str(&text) {
            Ok(p) => p,
            Err(e) => {
                warn!(file = %name, error = %e, "failed to parse policy file, skipping");
                continue;
            }
        };
        if let Err(e) = policy.validate() {
            warn!(file = %name, error = %e, "invalid policy file, skipping");
            continue;
        }

        model.insert(name, policy);
    }
    Ok(model)
}
