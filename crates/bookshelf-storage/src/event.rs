//! Events into the flow, and the async driver for hosts that run on tokio.
//!
//! Hosts with their own UI thread (the Android bindings) call
//! [`BackupRestoreFlow::handle`] directly from that thread and only use
//! [`EventSink`] to get worker results back. Hosts living on a tokio runtime
//! feed a channel into [`EventLoop`] instead.

use crate::flow::BackupRestoreFlow;
use crate::request::{FolderChoice, Operation, Ticket};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything that can happen to the flow, including every platform callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// User asked for a backup
    Backup,
    /// User asked for a restore
    Restore,
    /// User asked only to choose the folder (settings screen)
    SelectFolder { operation: Operation },
    FolderChosen { ticket: Ticket, choice: FolderChoice },
    FolderMenuDismissed { ticket: Ticket },
    PermissionResult { ticket: Ticket, granted: bool },
    DirectoryPicked { ticket: Ticket, path: PathBuf },
    /// Result of a system document-tree picker launch
    PickerResult {
        request_code: i32,
        result_code: i32,
        uri: Option<String>,
    },
    /// Remote backup names, delivered back from the listing worker
    RemoteCandidates(Vec<String>),
    RemoteChosen { ticket: Ticket, name: String },
    RemoteDeclined { ticket: Ticket },
}

/// Where work finished off the UI loop sends its results.
pub trait EventSink: Send + Sync {
    fn post(&self, event: UiEvent);
}

impl EventSink for mpsc::UnboundedSender<UiEvent> {
    fn post(&self, event: UiEvent) {
        if self.send(event).is_err() {
            log::warn!("UI loop has stopped, dropping event");
        }
    }
}

/// Sink that does not keep the loop alive on its own.
///
/// The flow holds one of these pointing at its own loop, so the loop can
/// still stop once every outside [`mpsc::UnboundedSender`] is gone.
pub struct LoopbackSink {
    sender: mpsc::WeakUnboundedSender<UiEvent>,
}

impl LoopbackSink {
    pub fn new(sender: &mpsc::UnboundedSender<UiEvent>) -> Self {
        Self {
            sender: sender.downgrade(),
        }
    }
}

impl EventSink for LoopbackSink {
    fn post(&self, event: UiEvent) {
        match self.sender.upgrade() {
            Some(sender) => sender.post(event),
            None => log::warn!("UI loop has stopped, dropping {event:?}"),
        }
    }
}

/// Drives a [`BackupRestoreFlow`] from a channel of [`UiEvent`]s.
///
/// All flow steps run on the task that awaits [`EventLoop::run`]; only the
/// remote listing leaves it.
pub struct EventLoop {
    flow: BackupRestoreFlow,
    events: mpsc::UnboundedReceiver<UiEvent>,
}

impl EventLoop {
    pub fn new(flow: BackupRestoreFlow, events: mpsc::UnboundedReceiver<UiEvent>) -> Self {
        Self { flow, events }
    }

    /// Handle events until every sender has been dropped, then hand the flow back.
    pub async fn run(mut self) -> BackupRestoreFlow {
        while let Some(event) = self.events.recv().await {
            log::debug!("Handling {event:?}");
            self.flow.handle(event);
        }
        log::info!("Event channel closed, stopping UI loop");
        self.flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_does_not_keep_channel_open() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let loopback = LoopbackSink::new(&sender);

        loopback.post(UiEvent::Backup);
        drop(sender);
        loopback.post(UiEvent::Restore);

        assert_eq!(receiver.recv().await, Some(UiEvent::Backup));
        assert_eq!(receiver.recv().await, None);
    }
}
