//! Recording fakes for every platform service the flow calls.
#![allow(dead_code)]

use bookshelf_config::Config;
use bookshelf_storage::{
    AppSignal, BACKUP_PATH_KEY, BackupEngine, BackupRestoreFlow, Completion, DirectoryPicker,
    DocumentAccess, EngineError, EventBus, EventSink, FolderChoice, FolderMenu, MemoryPathStore,
    Notifier, PathStore, Permission, PermissionGate, PlatformError, PlatformInfo, RemoteCatalog,
    RemoteRestoreDialog, RestoreEngine, Services, StoredPath, StoredPathSetting, SystemPicker,
    Ticket, UiEvent, Worker,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use url::Url;

pub const DEFAULT_PATH: &str = "/storage/emulated/0/BookShelf";
pub const LEGACY_SDK: u32 = 29;
pub const MODERN_SDK: u32 = 33;

#[derive(Debug, Default)]
pub struct Recorded {
    pub menus: Vec<(Ticket, String, Vec<FolderChoice>)>,
    pub permission_requests: Vec<(Ticket, Vec<Permission>, String)>,
    pub pickers_opened: Vec<i32>,
    pub directory_pickers: Vec<Ticket>,
    pub remote_dialogs: Vec<(Ticket, Vec<String>)>,
    pub toasts: Vec<String>,
    pub signals: Vec<AppSignal>,
    pub backups: Vec<String>,
    pub restores: Vec<String>,
    pub remote_restores: Vec<String>,
    pub grants: Vec<String>,
    pub write_checks: usize,
}

impl Recorded {
    pub fn engine_calls(&self) -> usize {
        self.backups.len() + self.restores.len() + self.remote_restores.len()
    }
}

pub struct FakePlatform {
    recorded: Mutex<Recorded>,
    pub writable: Mutex<bool>,
    pub picker_failure: Mutex<Option<PlatformError>>,
    pub grant_failure: Mutex<Option<PlatformError>>,
    pub remote_listing: Mutex<Result<Vec<String>, EngineError>>,
    pub engine_result: Mutex<Result<(), EngineError>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            recorded: Mutex::new(Recorded::default()),
            writable: Mutex::new(true),
            picker_failure: Mutex::new(None),
            grant_failure: Mutex::new(None),
            remote_listing: Mutex::new(Ok(Vec::new())),
            engine_result: Mutex::new(Ok(())),
        }
    }
}

impl FakePlatform {
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }

    fn finish(&self, done: Completion) {
        let result = self.engine_result.lock().unwrap().clone();
        done.finish(result);
    }
}

impl PermissionGate for FakePlatform {
    fn request(&self, ticket: Ticket, permissions: &[Permission], rationale: &str) {
        self.recorded().permission_requests.push((
            ticket,
            permissions.to_vec(),
            rationale.to_string(),
        ));
    }
}

impl SystemPicker for FakePlatform {
    fn open_document_tree(&self, request_code: i32) -> Result<(), PlatformError> {
        if let Some(e) = self.picker_failure.lock().unwrap().clone() {
            return Err(e);
        }
        self.recorded().pickers_opened.push(request_code);
        Ok(())
    }
}

impl DirectoryPicker for FakePlatform {
    fn pick_directory(&self, ticket: Ticket) -> Result<(), PlatformError> {
        if let Some(e) = self.picker_failure.lock().unwrap().clone() {
            return Err(e);
        }
        self.recorded().directory_pickers.push(ticket);
        Ok(())
    }
}

impl FolderMenu for FakePlatform {
    fn show(&self, ticket: Ticket, title: &str, choices: &[FolderChoice]) {
        self.recorded()
            .menus
            .push((ticket, title.to_string(), choices.to_vec()));
    }
}

impl RemoteRestoreDialog for FakePlatform {
    fn show(&self, ticket: Ticket, candidates: &[String]) {
        self.recorded()
            .remote_dialogs
            .push((ticket, candidates.to_vec()));
    }
}

impl DocumentAccess for FakePlatform {
    fn can_write(&self, _uri: &Url) -> bool {
        self.recorded().write_checks += 1;
        *self.writable.lock().unwrap()
    }

    fn take_persistable_grant(&self, uri: &Url) -> Result<(), PlatformError> {
        if let Some(e) = self.grant_failure.lock().unwrap().clone() {
            return Err(e);
        }
        self.recorded().grants.push(uri.to_string());
        Ok(())
    }
}

impl Notifier for FakePlatform {
    fn toast(&self, message: &str) {
        self.recorded().toasts.push(message.to_string());
    }
}

impl EventBus for FakePlatform {
    fn post(&self, signal: AppSignal) {
        self.recorded().signals.push(signal);
    }
}

impl BackupEngine for FakePlatform {
    fn backup(&self, target: &StoredPath, done: Completion) {
        self.recorded().backups.push(target.to_pref_string());
        self.finish(done);
    }
}

impl RestoreEngine for FakePlatform {
    fn restore(&self, source: &StoredPath, done: Completion) {
        self.recorded().restores.push(source.to_pref_string());
        self.finish(done);
    }

    fn restore_remote(&self, name: &str, done: Completion) {
        self.recorded().remote_restores.push(name.to_string());
        self.finish(done);
    }
}

impl RemoteCatalog for FakePlatform {
    fn list_remote_candidates(&self) -> Result<Vec<String>, EngineError> {
        self.remote_listing.lock().unwrap().clone()
    }
}

pub fn services(platform: &Arc<FakePlatform>) -> Services {
    Services {
        permissions: platform.clone(),
        system_picker: platform.clone(),
        directory_picker: platform.clone(),
        folder_menu: platform.clone(),
        remote_dialog: platform.clone(),
        documents: platform.clone(),
        notifier: platform.clone(),
        events: platform.clone(),
        backup_engine: platform.clone(),
        restore_engine: platform.clone(),
        remote_catalog: platform.clone(),
    }
}

pub fn config() -> Config {
    Config {
        default_backup_path: PathBuf::from(DEFAULT_PATH),
        legacy_storage_max_sdk: LEGACY_SDK,
        ..Config::default()
    }
}

pub fn build_flow(
    platform: &Arc<FakePlatform>,
    store: &MemoryPathStore,
    sdk_int: u32,
    runtime: tokio::runtime::Handle,
    sink: Arc<dyn EventSink>,
) -> BackupRestoreFlow {
    BackupRestoreFlow::new(
        services(platform),
        StoredPathSetting::load(Box::new(store.clone())),
        config(),
        PlatformInfo { sdk_int },
        Worker { runtime, sink },
    )
}

/// A flow driven by hand from a synchronous test.
pub struct Harness {
    pub platform: Arc<FakePlatform>,
    pub store: MemoryPathStore,
    pub flow: BackupRestoreFlow,
    sdk_int: u32,
    worker_sender: mpsc::UnboundedSender<UiEvent>,
    worker_events: mpsc::UnboundedReceiver<UiEvent>,
    runtime: tokio::runtime::Runtime,
}

impl Harness {
    pub fn new(stored: Option<&str>, sdk_int: u32) -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let platform = Arc::new(FakePlatform::default());
        let store = match stored {
            Some(value) => MemoryPathStore::with_value(BACKUP_PATH_KEY, value),
            None => MemoryPathStore::new(),
        };
        let (sender, worker_events) = mpsc::unbounded_channel();
        let flow = build_flow(
            &platform,
            &store,
            sdk_int,
            runtime.handle().clone(),
            Arc::new(sender.clone()),
        );

        Self {
            platform,
            store,
            flow,
            sdk_int,
            worker_sender: sender,
            worker_events,
            runtime,
        }
    }

    /// Another flow over the same store and platform, as a recreated activity builds
    pub fn recreate(&self) -> BackupRestoreFlow {
        build_flow(
            &self.platform,
            &self.store,
            self.sdk_int,
            self.runtime.handle().clone(),
            Arc::new(self.worker_sender.clone()),
        )
    }

    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.platform.recorded()
    }

    pub fn stored_raw(&self) -> Option<String> {
        self.store.get(BACKUP_PATH_KEY)
    }

    pub fn last_menu_ticket(&self) -> Ticket {
        self.recorded().menus.last().expect("no folder menu shown").0
    }

    pub fn last_permission_ticket(&self) -> Ticket {
        self.recorded()
            .permission_requests
            .last()
            .expect("no permission requested")
            .0
    }

    pub fn last_directory_ticket(&self) -> Ticket {
        *self
            .recorded()
            .directory_pickers
            .last()
            .expect("no directory picker shown")
    }

    pub fn last_remote_ticket(&self) -> Ticket {
        self.recorded()
            .remote_dialogs
            .last()
            .expect("no remote dialog shown")
            .0
    }

    pub fn choose(&mut self, choice: FolderChoice) {
        let ticket = self.last_menu_ticket();
        self.flow.handle(UiEvent::FolderChosen { ticket, choice });
    }

    pub fn answer_permission(&mut self, granted: bool) {
        let ticket = self.last_permission_ticket();
        self.flow
            .handle(UiEvent::PermissionResult { ticket, granted });
    }

    /// Wait for the worker's result and feed it to the flow
    pub fn deliver_worker_event(&mut self) {
        let event = self
            .worker_events
            .blocking_recv()
            .expect("worker channel closed");
        self.flow.handle(event);
    }
}
