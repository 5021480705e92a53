//! Small helpers over platform services: clipboard, intents, theme and battery.

use crate::messages::{CHOOSE_BROWSER, COPY_COMPLETE, GENERIC_ERROR, OPEN_URL_ERROR};
use crate::platform::{Notifier, PlatformError};
use url::Url;

/// `Intent.FLAG_ACTIVITY_NEW_TASK`
pub const FLAG_ACTIVITY_NEW_TASK: u32 = 0x1000_0000;
/// `Configuration.UI_MODE_NIGHT_MASK`
pub const UI_MODE_NIGHT_MASK: u32 = 0x30;
/// `Configuration.UI_MODE_NIGHT_YES`
pub const UI_MODE_NIGHT_YES: u32 = 0x20;

pub trait Clipboard: Send + Sync {
    fn set_primary_text(&self, text: &str);
    fn primary_text(&self) -> Option<String>;
}

/// Copy `text` and confirm with a toast. Without a clipboard service nothing happens.
pub fn send_to_clip(clipboard: Option<&dyn Clipboard>, notifier: &dyn Notifier, text: &str) {
    if let Some(clipboard) = clipboard {
        clipboard.set_primary_text(text);
        notifier.toast(COPY_COMPLETE);
    }
}

/// First clip item, trimmed. `None` only when there is no clip item at all.
pub fn clip_text(clipboard: Option<&dyn Clipboard>) -> Option<String> {
    let text = clipboard?.primary_text()?;
    Some(text.trim().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentAction {
    SendTo,
    View,
    Chooser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: IntentAction,
    pub data: Option<Url>,
    pub flags: u32,
    /// For [`IntentAction::Chooser`]: the wrapped intent and the chooser title
    pub target: Option<Box<Intent>>,
    pub title: Option<String>,
}

impl Intent {
    pub fn new(action: IntentAction, data: Url) -> Self {
        Self {
            action,
            data: Some(data),
            flags: FLAG_ACTIVITY_NEW_TASK,
            target: None,
            title: None,
        }
    }

    pub fn chooser(target: Intent, title: &str) -> Self {
        Self {
            action: IntentAction::Chooser,
            data: None,
            flags: 0,
            target: Some(Box::new(target)),
            title: Some(title.to_string()),
        }
    }
}

/// Starts activities from intents.
pub trait ActivityLauncher: Send + Sync {
    /// Whether some installed activity handles `intent`
    fn can_resolve(&self, intent: &Intent) -> bool;
    fn start(&self, intent: &Intent) -> Result<(), PlatformError>;
}

fn launch_or_toast(
    launcher: &dyn ActivityLauncher,
    notifier: &dyn Notifier,
    intent: &Intent,
    fallback: &str,
) {
    if let Err(e) = launcher.start(intent) {
        log::warn!("{e}");
        notifier.toast(&message_or(&e, fallback));
    }
}

fn message_or(error: &PlatformError, fallback: &str) -> String {
    match error {
        PlatformError::LaunchFailed { message: Some(text) } if !text.trim().is_empty() => {
            text.clone()
        }
        PlatformError::LaunchFailed { .. } => fallback.to_string(),
        other => other.user_message(),
    }
}

/// Open the mail app addressed to `address`.
pub fn send_mail(launcher: &dyn ActivityLauncher, notifier: &dyn Notifier, address: &str) {
    match Url::parse(&format!("mailto:{address}")) {
        Ok(uri) => launch_or_toast(
            launcher,
            notifier,
            &Intent::new(IntentAction::SendTo, uri),
            GENERIC_ERROR,
        ),
        Err(e) => {
            log::warn!("Bad mail address {address:?}: {e}");
            notifier.toast(GENERIC_ERROR);
        }
    }
}

/// Open `url` in a browser, going through a chooser when no default handler exists.
pub fn open_url(launcher: &dyn ActivityLauncher, notifier: &dyn Notifier, url: &str) {
    let uri = match Url::parse(url) {
        Ok(uri) => uri,
        Err(e) => {
            log::warn!("Bad url {url:?}: {e}");
            notifier.toast(OPEN_URL_ERROR);
            return;
        }
    };

    let intent = Intent::new(IntentAction::View, uri);
    if launcher.can_resolve(&intent) {
        launch_or_toast(launcher, notifier, &intent, OPEN_URL_ERROR);
    } else {
        let chooser = Intent::chooser(intent, CHOOSE_BROWSER);
        launch_or_toast(launcher, notifier, &chooser, OPEN_URL_ERROR);
    }
}

/// Whether the system UI mode is night mode
pub fn is_dark_mode(ui_mode: u32) -> bool {
    ui_mode & UI_MODE_NIGHT_MASK == UI_MODE_NIGHT_YES
}

/// Battery percentage from the sticky battery status, `-1` when there is none
pub fn battery_level(level: Option<i32>) -> i32 {
    level.unwrap_or(-1)
}
