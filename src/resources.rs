//! Scoped ownership of run temporaries.
//!
//! Every temporary file, directory and decoder process acquired during a run is registered here.
//! Release actions run in reverse registration order on every exit path, a failing release does
//! not stop the others, and releasing twice is a no-op.

use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::error::{NarrationError, NarrationResult};

/// Handle returned by registration; used for early release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

/// Shared handle to a decoder subprocess.
///
/// The reader that consumes the process output and the [`ResourceManager`] both hold a clone;
/// whichever closes first wins and later closes do nothing.
#[derive(Clone, Debug)]
pub struct ClipHandle {
    label: String,
    child: Arc<Mutex<Option<Child>>>,
}

impl ClipHandle {
    /// Wrap a spawned child process.
    pub fn new(label: impl Into<String>, child: Child) -> Self {
        Self {
            label: label.into(),
            child: Arc::new(Mutex::new(Some(child))),
        }
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Return `true` once the process has been closed.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Kill (if still running) and reap the process. Idempotent.
    pub fn close(&self) -> NarrationResult<()> {
        let Some(mut child) = self.lock().take() else {
            return Ok(());
        };
        if child
            .try_wait()
            .map_err(|e| NarrationError::render(format!("poll '{}': {e}", self.label)))?
            .is_none()
        {
            // The process may exit between the poll and the kill.
            let _ = child.kill();
        }
        child
            .wait()
            .map_err(|e| NarrationError::render(format!("reap '{}': {e}", self.label)))?;
        Ok(())
    }

    /// Wait for a normal exit and return its status. Idempotent; `None` if already closed.
    pub fn wait(&self) -> NarrationResult<Option<std::process::ExitStatus>> {
        let Some(mut child) = self.lock().take() else {
            return Ok(None);
        };
        let status = child
            .wait()
            .map_err(|e| NarrationError::render(format!("wait '{}': {e}", self.label)))?;
        Ok(Some(status))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A registered release action.
pub enum ReleaseAction {
    /// Delete a file; a missing file counts as released.
    RemoveFile(PathBuf),
    /// Delete a directory tree; a missing directory counts as released.
    RemoveDir(PathBuf),
    /// Close a decoder process.
    CloseClip(ClipHandle),
    /// Arbitrary cleanup.
    Custom(Box<dyn FnOnce() -> NarrationResult<()> + Send>),
}

impl std::fmt::Debug for ReleaseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoveFile(p) => f.debug_tuple("RemoveFile").field(p).finish(),
            Self::RemoveDir(p) => f.debug_tuple("RemoveDir").field(p).finish(),
            Self::CloseClip(c) => f.debug_tuple("CloseClip").field(&c.label()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ReleaseAction {
    fn run(self) -> NarrationResult<()> {
        match self {
            Self::RemoveFile(path) => match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(NarrationError::Other(anyhow::Error::new(e).context(format!(
                    "remove temporary file '{}'",
                    path.display()
                )))),
            },
            Self::RemoveDir(path) => match std::fs::remove_dir_all(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(NarrationError::Other(anyhow::Error::new(e).context(format!(
                    "remove temporary directory '{}'",
                    path.display()
                )))),
            },
            Self::CloseClip(clip) => clip.close(),
            Self::Custom(f) => f(),
        }
    }
}

/// One release that failed during [`ResourceManager::release_all`].
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Label given at registration.
    pub label: String,
    /// Underlying error.
    pub error: NarrationError,
}

struct Entry {
    id: ResourceId,
    label: String,
    action: ReleaseAction,
}

/// LIFO registry of release actions for one pipeline run.
#[derive(Default)]
pub struct ResourceManager {
    next_id: u64,
    entries: Vec<Entry>,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("pending", &self.entries.len())
            .finish()
    }
}

impl ResourceManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources not yet released.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Register a release action.
    pub fn register(&mut self, label: impl Into<String>, action: ReleaseAction) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        let label = label.into();
        tracing::trace!(label = %label, action = ?action, "resource registered");
        self.entries.push(Entry { id, label, action });
        id
    }

    /// Register a temporary file for deletion.
    pub fn register_file(&mut self, label: impl Into<String>, path: &Path) -> ResourceId {
        self.register(label, ReleaseAction::RemoveFile(path.to_path_buf()))
    }

    /// Register a temporary directory for recursive deletion.
    pub fn register_dir(&mut self, label: impl Into<String>, path: &Path) -> ResourceId {
        self.register(label, ReleaseAction::RemoveDir(path.to_path_buf()))
    }

    /// Register a decoder process for closing.
    pub fn register_clip(&mut self, clip: &ClipHandle) -> ResourceId {
        self.register(clip.label().to_string(), ReleaseAction::CloseClip(clip.clone()))
    }

    /// Register an arbitrary cleanup closure.
    pub fn register_fn(
        &mut self,
        label: impl Into<String>,
        f: impl FnOnce() -> NarrationResult<()> + Send + 'static,
    ) -> ResourceId {
        self.register(label, ReleaseAction::Custom(Box::new(f)))
    }

    /// Release one resource ahead of the rest. Unknown or already released ids are a no-op.
    pub fn release(&mut self, id: ResourceId) -> NarrationResult<()> {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(());
        };
        let entry = self.entries.remove(pos);
        entry.action.run()
    }

    /// Stop tracking `id` without running its action; the resource is kept.
    ///
    /// Returns whether `id` was still registered.
    pub fn dismiss(&mut self, id: ResourceId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = self.entries.remove(pos);
        tracing::trace!(label = %entry.label, "resource dismissed");
        true
    }

    /// Release everything still registered, newest first.
    ///
    /// Failures are logged and collected; they never stop the remaining releases.
    pub fn release_all(&mut self) -> Vec<ReleaseFailure> {
        let mut failures = Vec::new();
        while let Some(Entry { label, action, .. }) = self.entries.pop() {
            match action.run() {
                Ok(()) => tracing::debug!(label = %label, "resource released"),
                Err(error) => {
                    tracing::error!(label = %label, error = %error, "resource release failed");
                    failures.push(ReleaseFailure { label, error });
                }
            }
        }
        failures
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        let _ = self.release_all();
    }
}

#[cfg(test)]
#[path = "../tests/unit/resources.rs"]
mod tests;
