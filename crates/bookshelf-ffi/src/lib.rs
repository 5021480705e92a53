//! UniFFI bindings for the BookShelf Android app
//!
//! Exposes the backup/restore location flow to Kotlin. The app implements
//! the host interfaces in [`host`] over its real dialogs, pickers and
//! engines, and forwards every callback (permission answers, activity
//! results, dialog choices) to a [`BackupRestoreHandle`].

mod host;
mod platform;

pub use host::{EngineCompletion, FolderChoiceDto, HostEngines, HostStorage, HostUi};

use bookshelf_config::{Config, Preferences};
use bookshelf_storage::{
    BackupRestoreFlow, Operation, PickerRequest, PlatformInfo, StoredPathSetting, Ticket,
    UiEvent, Worker,
};
use host::HostAdapter;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

uniffi::setup_scaffolding!();

// ============ Errors ============

/// Errors that can cross the FFI boundary
/// Note: Field is named `reason` not `message` to avoid conflict with Throwable.message in Kotlin
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    /// A picker could not be started; `reason` is the platform's localized message (may be empty)
    #[error("Launch failed: {reason}")]
    LaunchFailed { reason: String },
    #[error("Grant failed: {reason}")]
    GrantFailed { reason: String },
    #[error("{reason}")]
    Engine { reason: String },
    #[error("Preferences error: {reason}")]
    Preferences { reason: String },
    #[error("Runtime error: {reason}")]
    Runtime { reason: String },
    #[error("Unexpected callback error: {reason}")]
    Unexpected { reason: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for FfiError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Unexpected { reason: e.reason }
    }
}

// ============ Logging ============

/// Install the platform logger. Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("BookshelfBackup"),
    );

    #[cfg(not(target_os = "android"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}

// ============ Context helpers ============

/// Whether `Configuration.uiMode` is in night mode
#[uniffi::export]
pub fn is_dark_mode(ui_mode: u32) -> bool {
    bookshelf_storage::context::is_dark_mode(ui_mode)
}

/// Battery percentage from `BatteryManager.EXTRA_LEVEL`, `-1` when unavailable
#[uniffi::export]
pub fn battery_level(level: Option<i32>) -> i32 {
    bookshelf_storage::context::battery_level(level)
}

// ============ Backup/restore handle ============

/// The app's single backup/restore flow.
///
/// Calls are expected on the UI thread. A call made while another is still
/// running (a host callback answering synchronously) is queued and handled
/// once the running step returns, so steps never interleave.
#[derive(uniffi::Object)]
pub struct BackupRestoreHandle {
    flow: Mutex<BackupRestoreFlow>,
    queue: Mutex<VecDeque<UiEvent>>,
    // Owns the blocking pool the remote listing runs on
    _runtime: tokio::runtime::Runtime,
}

#[uniffi::export]
impl BackupRestoreHandle {
    /// Create the flow over the app's host callbacks.
    ///
    /// `preferences_path` is where the chosen folder is remembered. When
    /// `sdk_int` is `None` it is read from the device.
    #[uniffi::constructor]
    pub fn new(
        ui: Arc<dyn HostUi>,
        storage: Arc<dyn HostStorage>,
        engines: Arc<dyn HostEngines>,
        preferences_path: String,
        sdk_int: Option<u32>,
    ) -> Result<Self, FfiError> {
        let sdk_int = sdk_int
            .or_else(platform::sdk_version)
            .ok_or_else(|| FfiError::Runtime {
                reason: "could not determine the Android SDK level".to_string(),
            })?;

        let mut config = Config::load_or_default().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config: {e}");
            Config::default()
        });
        config.preferences_path = PathBuf::from(preferences_path);

        let preferences =
            Preferences::shared(&config.preferences_path).map_err(|e| FfiError::Preferences {
                reason: e.to_string(),
            })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("bookshelf-backup")
            .build()
            .map_err(|e| FfiError::Runtime {
                reason: e.to_string(),
            })?;

        let host = HostAdapter::new(ui, storage, engines);
        let flow = BackupRestoreFlow::new(
            host.services(),
            StoredPathSetting::load(Box::new(preferences)),
            config,
            PlatformInfo { sdk_int },
            Worker {
                runtime: runtime.handle().clone(),
                sink: host,
            },
        );

        Ok(Self {
            flow: Mutex::new(flow),
            queue: Mutex::new(VecDeque::new()),
            _runtime: runtime,
        })
    }

    /// The remembered backup folder, if it is still usable
    pub fn stored_path(&self) -> Option<String> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        let flow = self.flow.lock().unwrap_or_else(|e| e.into_inner());
        flow.stored_path().map(|p| p.to_pref_string())
    }

    pub fn backup(&self) {
        self.dispatch(UiEvent::Backup);
    }

    pub fn restore(&self) {
        self.dispatch(UiEvent::Restore);
    }

    pub fn select_backup_folder(&self) {
        self.dispatch(UiEvent::SelectFolder {
            operation: Operation::Backup,
        });
    }

    pub fn select_restore_folder(&self) {
        self.dispatch(UiEvent::SelectFolder {
            operation: Operation::Restore,
        });
    }

    pub fn on_folder_chosen(&self, ticket: u64, choice: FolderChoiceDto) {
        self.dispatch(UiEvent::FolderChosen {
            ticket: Ticket(ticket),
            choice: choice.into(),
        });
    }

    pub fn on_folder_menu_dismissed(&self, ticket: u64) {
        self.dispatch(UiEvent::FolderMenuDismissed {
            ticket: Ticket(ticket),
        });
    }

    pub fn on_permission_result(&self, ticket: u64, granted: bool) {
        self.dispatch(UiEvent::PermissionResult {
            ticket: Ticket(ticket),
            granted,
        });
    }

    pub fn on_directory_picked(&self, ticket: u64, path: String) {
        self.dispatch(UiEvent::DirectoryPicked {
            ticket: Ticket(ticket),
            path: PathBuf::from(path),
        });
    }

    /// Forward `onActivityResult`. Returns whether the request code was ours.
    pub fn on_activity_result(
        &self,
        request_code: i32,
        result_code: i32,
        uri: Option<String>,
    ) -> bool {
        if PickerRequest::from_code(request_code).is_none() {
            return false;
        }
        self.dispatch(UiEvent::PickerResult {
            request_code,
            result_code,
            uri,
        });
        true
    }

    pub fn on_remote_candidates(&self, candidates: Vec<String>) {
        self.dispatch(UiEvent::RemoteCandidates(candidates));
    }

    pub fn on_remote_chosen(&self, ticket: u64, name: String) {
        self.dispatch(UiEvent::RemoteChosen {
            ticket: Ticket(ticket),
            name,
        });
    }

    pub fn on_remote_declined(&self, ticket: u64) {
        self.dispatch(UiEvent::RemoteDeclined {
            ticket: Ticket(ticket),
        });
    }
}

impl BackupRestoreHandle {
    fn queue(&self) -> MutexGuard<'_, VecDeque<UiEvent>> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_event(&self) -> Option<UiEvent> {
        self.queue().pop_front()
    }

    fn dispatch(&self, event: UiEvent) {
        self.queue().push_back(event);

        loop {
            // Whoever already holds the flow drains the queue, including this event
            let mut flow = match self.flow.try_lock() {
                Ok(flow) => flow,
                Err(std::sync::TryLockError::Poisoned(e)) => e.into_inner(),
                Err(std::sync::TryLockError::WouldBlock) => {
                    log::debug!("Flow busy, event queued");
                    return;
                }
            };
            while let Some(event) = self.next_event() {
                log::debug!("Handling {event:?}");
                flow.handle(event);
            }
            drop(flow);

            // An event pushed between the last pop and the unlock saw the flow
            // busy and left it to us
            if self.queue().is_empty() {
                return;
            }
        }
    }
}
