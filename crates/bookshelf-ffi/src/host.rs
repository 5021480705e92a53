//! Callback interfaces implemented by the Kotlin app, and their adapters
//! onto the platform traits the flow is written against.

use crate::FfiError;
use bookshelf_storage::{
    AppSignal, BackupEngine, Completion, DirectoryPicker, DocumentAccess, EngineError, EventBus,
    EventSink, FolderChoice, FolderMenu, Notifier, Permission, PermissionGate, PlatformError,
    RemoteCatalog, RemoteRestoreDialog, RestoreEngine, Services, StoredPath, SystemPicker, Ticket,
    UiEvent,
};
use std::sync::{Arc, Mutex};
use url::Url;

/// Dialogs, pickers and toasts. Every call arrives on the UI thread.
///
/// Answers must be posted back to the [`crate::BackupRestoreHandle`] later
/// (e.g. from the activity result callback), never from inside these calls;
/// an answer given re-entrantly is queued until the current step finishes.
#[uniffi::export(with_foreign)]
pub trait HostUi: Send + Sync {
    fn show_folder_menu(&self, ticket: u64, title: String, choices: Vec<FolderChoiceDto>);
    fn request_permissions(&self, ticket: u64, permissions: Vec<String>, rationale: String);
    /// `ACTION_OPEN_DOCUMENT_TREE` started for result with `request_code`
    fn open_document_tree(&self, request_code: i32) -> Result<(), FfiError>;
    fn open_directory_picker(&self, ticket: u64) -> Result<(), FfiError>;
    fn show_remote_restore_dialog(&self, ticket: u64, candidates: Vec<String>);
    fn toast(&self, message: String);
    /// Broadcast the "recreate" event so activities reload restored data
    fn post_recreate(&self);
    /// Called from a worker thread; post to the main looper and hand the
    /// names to [`crate::BackupRestoreHandle::on_remote_candidates`]
    fn deliver_remote_candidates(&self, candidates: Vec<String>);
}

#[uniffi::export(with_foreign)]
pub trait HostStorage: Send + Sync {
    fn can_write(&self, uri: String) -> bool;
    fn take_persistable_grant(&self, uri: String) -> Result<(), FfiError>;
}

/// The app's backup/restore engines. Each run must finish its completion exactly once.
#[uniffi::export(with_foreign)]
pub trait HostEngines: Send + Sync {
    fn backup(&self, target: String, done: Arc<EngineCompletion>);
    fn restore(&self, source: String, done: Arc<EngineCompletion>);
    fn restore_remote(&self, name: String, done: Arc<EngineCompletion>);
    /// Blocking; runs off the UI thread
    fn list_remote_candidates(&self) -> Result<Vec<String>, FfiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FolderChoiceDto {
    SystemPicker,
    AppPicker,
    LegacyDefault,
}

impl From<FolderChoice> for FolderChoiceDto {
    fn from(choice: FolderChoice) -> Self {
        match choice {
            FolderChoice::SystemPicker => Self::SystemPicker,
            FolderChoice::AppPicker => Self::AppPicker,
            FolderChoice::LegacyDefault => Self::LegacyDefault,
        }
    }
}

impl From<FolderChoiceDto> for FolderChoice {
    fn from(choice: FolderChoiceDto) -> Self {
        match choice {
            FolderChoiceDto::SystemPicker => Self::SystemPicker,
            FolderChoiceDto::AppPicker => Self::AppPicker,
            FolderChoiceDto::LegacyDefault => Self::LegacyDefault,
        }
    }
}

/// Outcome callback handed to a foreign engine.
///
/// Only the first call has any effect; later ones are logged and dropped.
#[derive(uniffi::Object)]
pub struct EngineCompletion {
    inner: Mutex<Option<Completion>>,
}

impl EngineCompletion {
    pub(crate) fn new(done: Completion) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Some(done)),
        })
    }

    fn take(&self) -> Option<Completion> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        let done = self.inner.lock().unwrap_or_else(|e| e.into_inner()).take();
        if done.is_none() {
            log::warn!("Engine completion reported more than once");
        }
        done
    }
}

#[uniffi::export]
impl EngineCompletion {
    pub fn succeeded(&self) {
        if let Some(done) = self.take() {
            done.succeeded();
        }
    }

    pub fn failed(&self, message: String) {
        if let Some(done) = self.take() {
            done.failed(&message);
        }
    }
}

fn platform_error(e: FfiError) -> PlatformError {
    match e {
        FfiError::LaunchFailed { reason } => PlatformError::LaunchFailed {
            message: Some(reason),
        },
        other => PlatformError::LaunchFailed {
            message: Some(other.to_string()),
        },
    }
}

/// Bridges the three foreign interfaces onto every platform trait.
pub(crate) struct HostAdapter {
    ui: Arc<dyn HostUi>,
    storage: Arc<dyn HostStorage>,
    engines: Arc<dyn HostEngines>,
}

impl HostAdapter {
    pub(crate) fn new(
        ui: Arc<dyn HostUi>,
        storage: Arc<dyn HostStorage>,
        engines: Arc<dyn HostEngines>,
    ) -> Arc<Self> {
        Arc::new(Self {
            ui,
            storage,
            engines,
        })
    }

    pub(crate) fn services(self: &Arc<Self>) -> Services {
        Services {
            permissions: self.clone(),
            system_picker: self.clone(),
            directory_picker: self.clone(),
            folder_menu: self.clone(),
            remote_dialog: self.clone(),
            documents: self.clone(),
            notifier: self.clone(),
            events: self.clone(),
            backup_engine: self.clone(),
            restore_engine: self.clone(),
            remote_catalog: self.clone(),
        }
    }
}

impl PermissionGate for HostAdapter {
    fn request(&self, ticket: Ticket, permissions: &[Permission], rationale: &str) {
        let permissions = permissions.iter().map(|p| p.as_str().to_string()).collect();
        self.ui
            .request_permissions(ticket.0, permissions, rationale.to_string());
    }
}

impl SystemPicker for HostAdapter {
    fn open_document_tree(&self, request_code: i32) -> Result<(), PlatformError> {
        self.ui.open_document_tree(request_code).map_err(platform_error)
    }
}

impl DirectoryPicker for HostAdapter {
    fn pick_directory(&self, ticket: Ticket) -> Result<(), PlatformError> {
        self.ui.open_directory_picker(ticket.0).map_err(platform_error)
    }
}

impl FolderMenu for HostAdapter {
    fn show(&self, ticket: Ticket, title: &str, choices: &[FolderChoice]) {
        let choices = choices.iter().copied().map(FolderChoiceDto::from).collect();
        self.ui.show_folder_menu(ticket.0, title.to_string(), choices);
    }
}

impl RemoteRestoreDialog for HostAdapter {
    fn show(&self, ticket: Ticket, candidates: &[String]) {
        self.ui
            .show_remote_restore_dialog(ticket.0, candidates.to_vec());
    }
}

impl DocumentAccess for HostAdapter {
    fn can_write(&self, uri: &Url) -> bool {
        self.storage.can_write(uri.to_string())
    }

    fn take_persistable_grant(&self, uri: &Url) -> Result<(), PlatformError> {
        self.storage
            .take_persistable_grant(uri.to_string())
            .map_err(|e| PlatformError::GrantFailed {
                uri: uri.to_string(),
                reason: match e {
                    FfiError::GrantFailed { reason } => reason,
                    other => other.to_string(),
                },
            })
    }
}

impl Notifier for HostAdapter {
    fn toast(&self, message: &str) {
        self.ui.toast(message.to_string());
    }
}

impl EventBus for HostAdapter {
    fn post(&self, signal: AppSignal) {
        match signal {
            AppSignal::Recreate => self.ui.post_recreate(),
        }
    }
}

impl EventSink for HostAdapter {
    fn post(&self, event: UiEvent) {
        match event {
            UiEvent::RemoteCandidates(names) => self.ui.deliver_remote_candidates(names),
            other => log::warn!("No route back to the UI thread for {other:?}"),
        }
    }
}

impl BackupEngine for HostAdapter {
    fn backup(&self, target: &StoredPath, done: Completion) {
        self.engines
            .backup(target.to_pref_string(), EngineCompletion::new(done));
    }
}

impl RestoreEngine for HostAdapter {
    fn restore(&self, source: &StoredPath, done: Completion) {
        self.engines
            .restore(source.to_pref_string(), EngineCompletion::new(done));
    }

    fn restore_remote(&self, name: &str, done: Completion) {
        self.engines
            .restore_remote(name.to_string(), EngineCompletion::new(done));
    }
}

impl RemoteCatalog for HostAdapter {
    fn list_remote_candidates(&self) -> Result<Vec<String>, EngineError> {
        self.engines
            .list_remote_candidates()
            .map_err(|e| EngineError::new(e.to_string()))
    }
}
