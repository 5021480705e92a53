//! Platform services the flow talks to.
//!
//! These are the seams to the host OS. The Android app implements them over
//! the real pickers, permission dialogs and content resolver; tests implement
//! them with recorders.

use crate::messages::GENERIC_ERROR;
use crate::request::{FolderChoice, Ticket};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadExternalStorage,
    WriteExternalStorage,
}

impl Permission {
    /// The permission group needed for plain filesystem backups
    pub const STORAGE: [Permission; 2] = [
        Permission::ReadExternalStorage,
        Permission::WriteExternalStorage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            Self::WriteExternalStorage => "android.permission.WRITE_EXTERNAL_STORAGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// A picker or activity could not be started; carries the platform's localized message if any
    #[error("Failed to launch: {}", .message.as_deref().unwrap_or("no message"))]
    LaunchFailed { message: Option<String> },

    #[error("Failed to persist access to {uri}: {reason}")]
    GrantFailed { uri: String, reason: String },
}

impl PlatformError {
    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self::LaunchFailed {
            message: Some(message.into()),
        }
    }

    /// Text suitable for a toast: the platform's message, or a generic fallback
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::LaunchFailed { message } => message.as_deref(),
            Self::GrantFailed { reason, .. } => Some(reason.as_str()),
        };
        match message {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => GENERIC_ERROR.to_string(),
        }
    }
}

/// What the device allows, captured at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// `Build.VERSION.SDK_INT`
    pub sdk_int: u32,
}

/// Runtime permission dialogs. The answer arrives later as
/// [`crate::UiEvent::PermissionResult`] carrying the same ticket.
pub trait PermissionGate: Send + Sync {
    fn request(&self, ticket: Ticket, permissions: &[Permission], rationale: &str);
}

/// The system document-tree picker. The result arrives later as
/// [`crate::UiEvent::PickerResult`] carrying `request_code`.
pub trait SystemPicker: Send + Sync {
    fn open_document_tree(&self, request_code: i32) -> Result<(), PlatformError>;
}

/// The app's own directory browser.
pub trait DirectoryPicker: Send + Sync {
    fn pick_directory(&self, ticket: Ticket) -> Result<(), PlatformError>;
}

/// The three-way "select folder" menu.
pub trait FolderMenu: Send + Sync {
    fn show(&self, ticket: Ticket, title: &str, choices: &[FolderChoice]);
}

/// Dialog listing remote backups the user may restore from.
pub trait RemoteRestoreDialog: Send + Sync {
    fn show(&self, ticket: Ticket, candidates: &[String]);
}

/// Content-URI access checks and grants.
pub trait DocumentAccess: Send + Sync {
    /// Live check; never cached by callers
    fn can_write(&self, uri: &Url) -> bool;
    /// Keep read+write access to `uri` across restarts
    fn take_persistable_grant(&self, uri: &Url) -> Result<(), PlatformError>;
}

/// Transient user-visible messages.
pub trait Notifier: Send + Sync {
    fn toast(&self, message: &str);
}

/// App-wide signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSignal {
    /// On-disk data changed underneath the UI; screens must be rebuilt
    Recreate,
}

pub trait EventBus: Send + Sync {
    fn post(&self, signal: AppSignal);
}

impl EventBus for tokio::sync::broadcast::Sender<AppSignal> {
    fn post(&self, signal: AppSignal) {
        if self.send(signal).is_err() {
            log::debug!("No subscribers for {signal:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_platform_text() {
        let error = PlatformError::launch_failed("No activity found to handle Intent");

        assert_eq!(error.user_message(), "No activity found to handle Intent");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        assert_eq!(
            PlatformError::LaunchFailed { message: None }.user_message(),
            "Error"
        );
        assert_eq!(PlatformError::launch_failed("  ").user_message(), "Error");
    }

    #[test]
    fn test_storage_group_names() {
        let names: Vec<_> = Permission::STORAGE.iter().map(|p| p.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "android.permission.READ_EXTERNAL_STORAGE",
                "android.permission.WRITE_EXTERNAL_STORAGE",
            ]
        );
    }

    #[tokio::test]
    async fn test_broadcast_bus_delivers_to_subscribers() {
        let (sender, mut receiver) = tokio::sync::broadcast::channel(4);

        sender.post(AppSignal::Recreate);

        assert_eq!(receiver.recv().await.unwrap(), AppSignal::Recreate);
    }

    #[test]
    fn test_broadcast_bus_without_subscribers_is_silent() {
        let (sender, receiver) = tokio::sync::broadcast::channel::<AppSignal>(4);
        drop(receiver);

        sender.post(AppSignal::Recreate);
    }
}
