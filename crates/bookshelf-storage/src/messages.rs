//! User-facing text shown by the flow and the context helpers.

pub const SELECT_FOLDER_TITLE: &str = "Select folder";
pub const STORAGE_RATIONALE: &str = "Storage permission is needed to back up book information";
pub const BACKUP_SUCCESS: &str = "Backup succeeded";
pub const RESTORE_SUCCESS: &str = "Restore succeeded";
pub const GENERIC_ERROR: &str = "Error";
pub const COPY_COMPLETE: &str = "Copied to clipboard";
pub const OPEN_URL_ERROR: &str = "open url error";
pub const CHOOSE_BROWSER: &str = "Choose a browser";
