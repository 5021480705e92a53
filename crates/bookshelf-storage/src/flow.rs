//! Backup/restore location resolution.
//!
//! Decides, from the stored backup folder and what the device allows,
//! whether to run an engine right away, ask for storage permission first,
//! or ask the user to choose a folder. Every answer from the platform comes
//! back through [`BackupRestoreFlow::handle`] and is matched against the
//! continuation recorded when the prompt was shown.

use crate::engine::{BackupEngine, Completion, RemoteCatalog, RestoreEngine};
use crate::event::{EventSink, UiEvent};
use crate::messages::{SELECT_FOLDER_TITLE, STORAGE_RATIONALE};
use crate::path::StoredPath;
use crate::pending::{AfterGrant, Continuation, PendingRequests};
use crate::platform::{
    DirectoryPicker, DocumentAccess, EventBus, FolderMenu, Notifier, Permission, PermissionGate,
    PlatformError, PlatformInfo, RemoteRestoreDialog, SystemPicker,
};
use crate::request::{FolderChoice, Operation, PickerRequest, RESULT_OK, Ticket};
use crate::setting::StoredPathSetting;
use bookshelf_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the flow calls out to.
#[derive(Clone)]
pub struct Services {
    pub permissions: Arc<dyn PermissionGate>,
    pub system_picker: Arc<dyn SystemPicker>,
    pub directory_picker: Arc<dyn DirectoryPicker>,
    pub folder_menu: Arc<dyn FolderMenu>,
    pub remote_dialog: Arc<dyn RemoteRestoreDialog>,
    pub documents: Arc<dyn DocumentAccess>,
    pub notifier: Arc<dyn Notifier>,
    pub events: Arc<dyn EventBus>,
    pub backup_engine: Arc<dyn BackupEngine>,
    pub restore_engine: Arc<dyn RestoreEngine>,
    pub remote_catalog: Arc<dyn RemoteCatalog>,
}

/// Where background work runs and how its results get back to the UI loop.
#[derive(Clone)]
pub struct Worker {
    pub runtime: tokio::runtime::Handle,
    pub sink: Arc<dyn EventSink>,
}

pub struct BackupRestoreFlow {
    services: Services,
    stored: StoredPathSetting,
    pending: PendingRequests,
    config: Config,
    platform: PlatformInfo,
    worker: Worker,
}

impl BackupRestoreFlow {
    pub fn new(
        services: Services,
        stored: StoredPathSetting,
        config: Config,
        platform: PlatformInfo,
        worker: Worker,
    ) -> Self {
        log::info!(
            "Backup flow ready (sdk {}, legacy storage {})",
            platform.sdk_int,
            if config.allows_legacy_storage(platform.sdk_int) {
                "allowed"
            } else {
                "forbidden"
            }
        );
        Self {
            services,
            stored,
            pending: PendingRequests::new(),
            config,
            platform,
            worker,
        }
    }

    /// The stored location, if present and usable
    pub fn stored_path(&self) -> Option<StoredPath> {
        self.stored.get()
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    pub fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Backup => self.backup(),
            UiEvent::Restore => self.restore(),
            UiEvent::SelectFolder { operation } => self.select_folder(operation, false),
            UiEvent::FolderChosen { ticket, choice } => self.on_folder_chosen(ticket, choice),
            UiEvent::FolderMenuDismissed { ticket } => self.on_folder_menu_dismissed(ticket),
            UiEvent::PermissionResult { ticket, granted } => {
                self.on_permission_result(ticket, granted)
            }
            UiEvent::DirectoryPicked { ticket, path } => self.on_directory_picked(ticket, path),
            UiEvent::PickerResult {
                request_code,
                result_code,
                uri,
            } => self.on_picker_result(request_code, result_code, uri),
            UiEvent::RemoteCandidates(names) => self.on_remote_candidates(names),
            UiEvent::RemoteChosen { ticket, name } => self.on_remote_chosen(ticket, name),
            UiEvent::RemoteDeclined { ticket } => self.on_remote_declined(ticket),
        }
    }

    /// Back up to the stored location, asking for one if needed
    pub fn backup(&mut self) {
        self.resolve(Operation::Backup);
    }

    /// Offer remote backups first; fall back to the stored location.
    ///
    /// The listing runs on the worker and comes back as
    /// [`UiEvent::RemoteCandidates`].
    pub fn restore(&mut self) {
        log::info!("Listing remote restore candidates");
        let catalog = Arc::clone(&self.services.remote_catalog);
        let sink = Arc::clone(&self.worker.sink);
        self.worker.runtime.spawn_blocking(move || {
            let names = catalog.list_remote_candidates().unwrap_or_else(|e| {
                log::warn!("Remote listing failed, restoring locally: {e}");
                Vec::new()
            });
            sink.post(UiEvent::RemoteCandidates(names));
        });
    }

    /// Run `operation` against the stored location, or find out where to run it.
    pub fn resolve(&mut self, operation: Operation) {
        match self.stored.get() {
            None => {
                log::info!(
                    "No usable {operation} folder stored ({:?}), asking user",
                    self.stored.raw()
                );
                self.select_folder(operation, true);
            }
            Some(StoredPath::Content(uri)) => {
                if self.services.documents.can_write(&uri) {
                    self.run_engine(operation, &StoredPath::Content(uri));
                } else {
                    log::info!("Write access to {uri} was revoked, asking user");
                    self.select_folder(operation, true);
                }
            }
            Some(StoredPath::Filesystem(path)) => {
                if self.config.allows_legacy_storage(self.platform.sdk_int) {
                    self.request_storage(operation, AfterGrant::Persist { target: path, act: true });
                } else {
                    log::info!(
                        "SDK {} cannot use {}, asking user",
                        self.platform.sdk_int,
                        path.display()
                    );
                    self.select_folder(operation, true);
                }
            }
        }
    }

    /// Show the folder menu. With `act`, the operation runs once a folder is chosen.
    pub fn select_folder(&mut self, operation: Operation, act: bool) {
        let ticket = self
            .pending
            .issue(Continuation::FolderMenu { operation, act });
        self.services
            .folder_menu
            .show(ticket, SELECT_FOLDER_TITLE, &FolderChoice::ALL);
    }

    fn on_folder_chosen(&mut self, ticket: Ticket, choice: FolderChoice) {
        let (operation, act) = match self.pending.take(ticket) {
            Some(Continuation::FolderMenu { operation, act }) => (operation, act),
            other => return self.ignore(ticket, other),
        };
        log::info!("Folder choice for {operation}: {choice:?}");

        match choice {
            FolderChoice::SystemPicker => {
                self.launch_system_picker(PickerRequest::new(operation, act))
            }
            FolderChoice::AppPicker => {
                self.request_storage(operation, AfterGrant::OpenAppPicker { act })
            }
            FolderChoice::LegacyDefault => {
                let target = self.config.default_backup_path.clone();
                self.request_storage(operation, AfterGrant::Persist { target, act })
            }
        }
    }

    fn on_folder_menu_dismissed(&mut self, ticket: Ticket) {
        match self.pending.take(ticket) {
            Some(Continuation::FolderMenu { operation, .. }) => {
                log::debug!("Folder menu for {operation} dismissed");
            }
            other => self.ignore(ticket, other),
        }
    }

    fn launch_system_picker(&mut self, request: PickerRequest) {
        match self.services.system_picker.open_document_tree(request.code()) {
            Ok(()) => self.pending.launch_picker(request),
            Err(e) => self.report_launch_failure(e),
        }
    }

    fn request_storage(&mut self, operation: Operation, then: AfterGrant) {
        let ticket = self
            .pending
            .issue(Continuation::StoragePermission { operation, then });
        self.services
            .permissions
            .request(ticket, &Permission::STORAGE, STORAGE_RATIONALE);
    }

    fn on_permission_result(&mut self, ticket: Ticket, granted: bool) {
        let (operation, then) = match self.pending.take(ticket) {
            Some(Continuation::StoragePermission { operation, then }) => (operation, then),
            other => return self.ignore(ticket, other),
        };
        if !granted {
            log::debug!("Storage permission denied for {operation}");
            return;
        }

        match then {
            AfterGrant::Persist { target, act } => {
                let target = StoredPath::Filesystem(target);
                self.stored.set(Some(&target));
                if act {
                    self.run_engine(operation, &target);
                }
            }
            AfterGrant::OpenAppPicker { act } => self.open_app_picker(operation, act),
        }
    }

    fn open_app_picker(&mut self, operation: Operation, act: bool) {
        let ticket = self
            .pending
            .issue(Continuation::AppPicker { operation, act });
        if let Err(e) = self.services.directory_picker.pick_directory(ticket) {
            self.pending.take(ticket);
            self.report_launch_failure(e);
        }
    }

    fn on_directory_picked(&mut self, ticket: Ticket, path: PathBuf) {
        let (operation, act) = match self.pending.take(ticket) {
            Some(Continuation::AppPicker { operation, act }) => (operation, act),
            other => return self.ignore(ticket, other),
        };

        let target = StoredPath::Filesystem(path);
        self.stored.set(Some(&target));
        if act {
            self.run_engine(operation, &target);
        }
    }

    fn on_picker_result(&mut self, request_code: i32, result_code: i32, uri: Option<String>) {
        let Some(request) = PickerRequest::from_code(request_code) else {
            log::debug!("Ignoring activity result for request code {request_code}");
            return;
        };
        // The request code carries the continuation, so a result is handled
        // even when the activity that launched the picker has been recreated
        if !self.pending.take_picker(request) {
            if self.pending.repeats_last_pick(request, uri.as_deref()) {
                log::warn!("Repeated result for request code {request_code}, ignoring");
                return;
            }
            log::info!("No launch recorded for request code {request_code}, accepting result");
        }
        if result_code != RESULT_OK {
            log::info!("Folder picker for {} cancelled", request.operation);
            return;
        }

        let (raw, tree) = match uri.as_deref().map(|raw| (raw, StoredPath::parse(raw))) {
            Some((raw, Some(StoredPath::Content(tree)))) => (raw, tree),
            _ => {
                log::warn!("Folder picker returned no usable document tree: {uri:?}");
                return;
            }
        };
        if let Err(e) = self.services.documents.take_persistable_grant(&tree) {
            log::warn!("{e}");
            self.services.notifier.toast(&e.user_message());
            return;
        }

        self.pending.record_picked(request, raw);
        let target = StoredPath::Content(tree);
        self.stored.set(Some(&target));
        if request.acts() {
            self.run_engine(request.operation, &target);
        }
    }

    fn on_remote_candidates(&mut self, names: Vec<String>) {
        if names.is_empty() {
            log::info!("No remote backups, restoring from stored folder");
            self.resolve(Operation::Restore);
            return;
        }
        log::info!("Offering {} remote backups", names.len());
        let ticket = self.pending.issue(Continuation::RemoteDialog);
        self.services.remote_dialog.show(ticket, &names);
    }

    fn on_remote_chosen(&mut self, ticket: Ticket, name: String) {
        match self.pending.take(ticket) {
            Some(Continuation::RemoteDialog) => {
                log::info!("Starting restore from remote backup {name}");
                let done = self.completion(Operation::Restore);
                self.services.restore_engine.restore_remote(&name, done);
            }
            other => self.ignore(ticket, other),
        }
    }

    fn on_remote_declined(&mut self, ticket: Ticket) {
        match self.pending.take(ticket) {
            Some(Continuation::RemoteDialog) => self.resolve(Operation::Restore),
            other => self.ignore(ticket, other),
        }
    }

    fn run_engine(&self, operation: Operation, target: &StoredPath) {
        log::info!("Starting {operation} with {target}");
        let done = self.completion(operation);
        match operation {
            Operation::Backup => self.services.backup_engine.backup(target, done),
            Operation::Restore => self.services.restore_engine.restore(target, done),
        }
    }

    fn completion(&self, operation: Operation) -> Completion {
        Completion::new(
            operation,
            Arc::clone(&self.services.notifier),
            Arc::clone(&self.services.events),
        )
    }

    fn report_launch_failure(&self, error: PlatformError) {
        log::warn!("{error}");
        self.services.notifier.toast(&error.user_message());
    }

    /// Answers for tickets we no longer (or never) held, or of the wrong
    /// kind, are dropped. A mismatched continuation is put back.
    fn ignore(&mut self, ticket: Ticket, taken: Option<Continuation>) {
        match taken {
            Some(continuation) => {
                log::warn!(
                    "Ticket {ticket} belongs to a {}, ignoring mismatched answer",
                    continuation.kind()
                );
                self.pending.restore(ticket, continuation);
            }
            None => log::warn!("No pending request for ticket {ticket}, ignoring"),
        }
    }
}
