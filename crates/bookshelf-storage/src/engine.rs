//! The engines that actually write and read backup data, and the
//! completion handle they report back through.

use crate::messages::{BACKUP_SUCCESS, RESTORE_SUCCESS};
use crate::path::StoredPath;
use crate::platform::{AppSignal, EventBus, Notifier};
use crate::request::Operation;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by an engine. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait BackupEngine: Send + Sync {
    fn backup(&self, target: &StoredPath, done: Completion);
}

pub trait RestoreEngine: Send + Sync {
    fn restore(&self, source: &StoredPath, done: Completion);
    /// Restore from a named backup offered by [`RemoteCatalog`]
    fn restore_remote(&self, name: &str, done: Completion);
}

/// Remote backup listing (e.g. WebDAV). Called from a blocking worker thread.
pub trait RemoteCatalog: Send + Sync {
    fn list_remote_candidates(&self) -> Result<Vec<String>, EngineError>;
}

/// Terminal callback for one engine run.
///
/// Consuming it reports the outcome to the user exactly once. It may be
/// finished from any thread.
pub struct Completion {
    operation: Operation,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventBus>,
}

impl Completion {
    pub fn new(operation: Operation, notifier: Arc<dyn Notifier>, events: Arc<dyn EventBus>) -> Self {
        Self {
            operation,
            notifier,
            events,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn succeeded(self) {
        log::info!("{} succeeded", self.operation);
        match self.operation {
            Operation::Backup => self.notifier.toast(BACKUP_SUCCESS),
            Operation::Restore => {
                self.notifier.toast(RESTORE_SUCCESS);
                self.events.post(AppSignal::Recreate);
            }
        }
    }

    pub fn failed(self, message: &str) {
        log::warn!("{} failed: {message}", self.operation);
        self.notifier.toast(message);
    }

    pub fn finish(self, result: Result<(), EngineError>) {
        match result {
            Ok(()) => self.succeeded(),
            Err(e) => self.failed(&e.message),
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}
