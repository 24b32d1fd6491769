//! Upload Session Tracker
//!
//! Tracks a collection of file uploads with:
//! - One independent submission task per file
//! - Replace-by-id updates under a single lock, so concurrent completions never clobber each other
//! - Bounded settlement: timeouts and panics in the endpoint end in `Error`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::endpoint::UploadEndpoint;
use super::notify::{Notification, Notifier};
use super::types::{
    EntryId, FileRef, UploadEntry, UploadError, UploadReceipt, UploadStatus, PROGRESS_COMPLETE,
    PROGRESS_UPLOADING,
};

/// Default time allowed for one endpoint call
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Options
// ============================================================================

/// Bounded retry policy applied while an entry stays `Uploading`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total endpoint calls per entry, at least 1
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt; the user re-adds the file to retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn attempts(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Tracker tuning
#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Owns the upload entries and drives each one to a terminal state
#[derive(Clone)]
pub struct UploadTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    /// Entries in insertion order
    entries: RwLock<Vec<UploadEntry>>,

    /// Submission tasks not yet awaited
    tasks: Mutex<Vec<(EntryId, JoinHandle<()>)>>,

    endpoint: Arc<dyn UploadEndpoint>,
    notifier: Arc<dyn Notifier>,
    options: TrackerOptions,
}

impl UploadTracker {
    /// Create a tracker with a single attempt per entry
    pub fn new(endpoint: Arc<dyn UploadEndpoint>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_options(endpoint, notifier, TrackerOptions::default())
    }

    pub fn with_options(
        endpoint: Arc<dyn UploadEndpoint>,
        notifier: Arc<dyn Notifier>,
        options: TrackerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                entries: RwLock::new(Vec::new()),
                tasks: Mutex::new(Vec::new()),
                endpoint,
                notifier,
                options,
            }),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Track a batch of files and start uploading each one
    ///
    /// Returns the new `Pending` entries before any upload settles.
    pub async fn add_files(&self, files: impl IntoIterator<Item = FileRef>) -> Vec<UploadEntry> {
        let created: Vec<UploadEntry> = files.into_iter().map(UploadEntry::new).collect();
        if created.is_empty() {
            return created;
        }

        {
            let mut entries = self.inner.entries.write().await;
            entries.extend(created.iter().cloned());
        }

        let mut handles = Vec::with_capacity(created.len());
        for entry in &created {
            tracing::info!(
                entry_id = %entry.id,
                file_name = %entry.name,
                file_size = entry.size,
                endpoint = self.inner.endpoint.name(),
                "Queued upload"
            );

            let tracker = self.clone();
            let id = entry.id.clone();
            let file = entry.file.clone();
            let handle = tokio::spawn(async move { tracker.submit(id, file).await });
            handles.push((entry.id.clone(), handle));
        }

        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|(_, handle)| !handle.is_finished());
        tasks.extend(handles);
        drop(tasks);

        created
    }

    /// Remove a finished entry
    ///
    /// Entries still `Pending` or `Uploading` are rejected and stay tracked.
    pub async fn remove(&self, id: &EntryId) -> Result<UploadEntry, UploadError> {
        let mut entries = self.inner.entries.write().await;

        let index = entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| UploadError::EntryNotFound(id.clone()))?;

        if !entries[index].is_terminal() {
            return Err(UploadError::NotTerminal {
                id: id.clone(),
                status: entries[index].status,
            });
        }

        let removed = entries.remove(index);

        tracing::debug!(
            entry_id = %removed.id,
            file_name = %removed.name,
            status = %removed.status,
            "Removed upload entry"
        );

        Ok(removed)
    }

    /// Remove every finished entry, returning how many were removed
    pub async fn clear_finished(&self) -> usize {
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !e.is_terminal());
        before - entries.len()
    }

    /// Wait until every submission started so far has settled
    pub async fn wait_settled(&self) {
        loop {
            let handles = std::mem::take(&mut *self.inner.tasks.lock().await);
            if handles.is_empty() {
                break;
            }

            for (id, handle) in handles {
                if let Err(e) = handle.await {
                    tracing::error!(entry_id = %id, error = %e, "Upload task aborted");
                    self.fail_if_pending(&id, UploadError::TaskFailed(e.to_string()))
                        .await;
                }
            }
        }
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    /// Snapshot of all entries in insertion order
    pub async fn entries(&self) -> Vec<UploadEntry> {
        self.inner.entries.read().await.clone()
    }

    /// Snapshot of one entry
    pub async fn entry(&self, id: &EntryId) -> Option<UploadEntry> {
        let entries = self.inner.entries.read().await;
        entries.iter().find(|e| &e.id == id).cloned()
    }

    /// Number of entries not yet settled
    pub async fn active_count(&self) -> usize {
        let entries = self.inner.entries.read().await;
        entries.iter().filter(|e| !e.is_terminal()).count()
    }

    /// True when at least one entry exists and all of them succeeded
    pub async fn all_succeeded(&self) -> bool {
        let entries = self.inner.entries.read().await;
        !entries.is_empty() && entries.iter().all(|e| e.status == UploadStatus::Success)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    async fn submit(&self, id: EntryId, file: FileRef) {
        let started = self
            .update(&id, |entry| {
                entry.status = UploadStatus::Uploading;
                entry.progress = PROGRESS_UPLOADING;
            })
            .await;
        if started.is_none() {
            return;
        }

        match self.call_endpoint(&id, &file).await {
            Ok(receipt) => {
                self.update(&id, |entry| {
                    entry.status = UploadStatus::Success;
                    entry.progress = PROGRESS_COMPLETE;
                    entry.receipt = Some(receipt);
                })
                .await;

                tracing::info!(entry_id = %id, file_name = %file.name(), "Upload succeeded");
                self.inner.notifier.notify(Notification::uploaded(file.name()));
            }
            Err(err) => {
                self.mark_failed(&id, &err).await;

                tracing::warn!(
                    entry_id = %id,
                    file_name = %file.name(),
                    error = %err,
                    "Upload failed"
                );
                self.notify_failure(file.name(), &err);
            }
        }
    }

    async fn call_endpoint(&self, id: &EntryId, file: &FileRef) -> Result<UploadReceipt, UploadError> {
        let retry = self.inner.options.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.update(id, |entry| entry.attempts = attempt).await;

            match self.attempt(file).await {
                Ok(receipt) => return Ok(receipt),
                Err(err) if attempt < retry.max_attempts => {
                    tracing::debug!(
                        entry_id = %id,
                        attempt = attempt,
                        max_attempts = retry.max_attempts,
                        error = %err,
                        "Upload attempt failed, retrying"
                    );
                    tokio::time::sleep(retry.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One endpoint call, bounded by the timeout and shielded from panics
    async fn attempt(&self, file: &FileRef) -> Result<UploadReceipt, UploadError> {
        let timeout = self.inner.options.timeout;
        let call = AssertUnwindSafe(self.inner.endpoint.upload(file)).catch_unwind();

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(UploadError::TaskFailed(panic_message(panic.as_ref()))),
            Err(_) => Err(UploadError::Timeout(timeout)),
        }
    }

    async fn mark_failed(&self, id: &EntryId, err: &UploadError) {
        self.update(id, |entry| {
            entry.status = UploadStatus::Error;
            entry.progress = 0;
            entry.error = Some(err.to_string());
        })
        .await;
    }

    async fn fail_if_pending(&self, id: &EntryId, err: UploadError) {
        let name = {
            let mut entries = self.inner.entries.write().await;
            match entries.iter_mut().find(|e| &e.id == id) {
                Some(entry) if !entry.is_terminal() => {
                    entry.status = UploadStatus::Error;
                    entry.progress = 0;
                    entry.error = Some(err.to_string());
                    Some(entry.name.clone())
                }
                _ => None,
            }
        };

        if let Some(name) = name {
            self.notify_failure(&name, &err);
        }
    }

    fn notify_failure(&self, file_name: &str, err: &UploadError) {
        let notification = if err.is_fault() {
            Notification::faulted(file_name)
        } else {
            Notification::rejected(file_name)
        };
        self.inner.notifier.notify(notification);
    }

    /// Apply `f` to the entry with this id, replacing it in place
    async fn update<F>(&self, id: &EntryId, f: F) -> Option<UploadEntry>
    where
        F: FnOnce(&mut UploadEntry),
    {
        let mut entries = self.inner.entries.write().await;
        let entry = entries.iter_mut().find(|e| &e.id == id)?;
        f(entry);
        Some(entry.clone())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "upload endpoint panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
