use crate::path::StoredPath;
use bookshelf_config::{PrefError, Preferences, SharedPreferences};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Preference key holding the last chosen backup/restore location
pub const BACKUP_PATH_KEY: &str = "backupPath";

/// A single-string preference store.
pub trait PathStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value`; `None` or an empty string removes the key
    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), PrefError>;
}

impl PathStore for Preferences {
    fn get(&self, key: &str) -> Option<String> {
        self.get_string(key)
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), PrefError> {
        self.put_string(key, value.filter(|v| !v.is_empty()))
    }
}

impl PathStore for SharedPreferences {
    fn get(&self, key: &str) -> Option<String> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        self.lock().unwrap_or_else(|e| e.into_inner()).get_string(key)
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), PrefError> {
        let mut prefs = self.lock().unwrap_or_else(|e| e.into_inner());
        PathStore::set(&mut *prefs, key, value)
    }
}

/// In-memory store. Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct MemoryPathStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.lock().insert(key.to_string(), value.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Recover from poisoned mutex (another thread panicked while holding lock)
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PathStore for MemoryPathStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), PrefError> {
        let mut values = self.lock();
        match value.filter(|v| !v.is_empty()) {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        Ok(())
    }
}

/// The backup location setting.
///
/// Every read goes to the store, so flows sharing one store always see the
/// location the latest of them persisted.
pub struct StoredPathSetting {
    store: Box<dyn PathStore>,
}

impl StoredPathSetting {
    pub fn load(store: Box<dyn PathStore>) -> Self {
        log::debug!("Loaded {BACKUP_PATH_KEY}: {:?}", store.get(BACKUP_PATH_KEY));
        Self { store }
    }

    /// The raw stored text, valid or not
    pub fn raw(&self) -> Option<String> {
        self.store.get(BACKUP_PATH_KEY)
    }

    /// The stored location, if present and usable
    pub fn get(&self) -> Option<StoredPath> {
        self.raw().as_deref().and_then(StoredPath::parse)
    }

    /// Persist `value`. A failed write is logged; the store keeps the new
    /// value for this process.
    pub fn set(&mut self, value: Option<&StoredPath>) {
        let text = value.map(StoredPath::to_pref_string);
        log::info!("Persisting {BACKUP_PATH_KEY}: {text:?}");
        if let Err(e) = self.store.set(BACKUP_PATH_KEY, text.as_deref()) {
            log::error!("Failed to persist {BACKUP_PATH_KEY}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_absent_value_loads_as_none() {
        let setting = StoredPathSetting::load(Box::new(MemoryPathStore::new()));

        assert_eq!(setting.raw(), None);
        assert_eq!(setting.get(), None);
    }

    #[test]
    fn test_invalid_value_is_kept_raw_but_unusable() {
        let store = MemoryPathStore::with_value(BACKUP_PATH_KEY, "not/absolute");
        let setting = StoredPathSetting::load(Box::new(store));

        assert_eq!(setting.raw().as_deref(), Some("not/absolute"));
        assert_eq!(setting.get(), None);
    }

    #[test]
    fn test_set_writes_through() {
        let store = MemoryPathStore::new();
        let mut setting = StoredPathSetting::load(Box::new(store.clone()));
        let target = StoredPath::parse("content://x/y").unwrap();

        setting.set(Some(&target));

        assert_eq!(store.get(BACKUP_PATH_KEY).as_deref(), Some("content://x/y"));
        assert_eq!(setting.get(), Some(target));
    }

    #[test]
    fn test_clearing_removes_key() {
        let store = MemoryPathStore::with_value(BACKUP_PATH_KEY, "/sdcard/BookShelf");
        let mut setting = StoredPathSetting::load(Box::new(store.clone()));

        setting.set(None);

        assert_eq!(store.get(BACKUP_PATH_KEY), None);
    }

    #[test]
    fn test_preferences_backed_setting_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let prefs_path = temp_dir.path().join("prefs.toml");
        let target = StoredPath::Filesystem(PathBuf::from("/storage/emulated/0/BookShelf"));

        let mut setting = StoredPathSetting::load(Box::new(Preferences::open(&prefs_path).unwrap()));
        setting.set(Some(&target));

        let reloaded = StoredPathSetting::load(Box::new(Preferences::open(&prefs_path).unwrap()));
        assert_eq!(reloaded.get(), Some(target));
    }

    #[test]
    fn test_preferences_empty_string_removes_key() {
        let temp_dir = TempDir::new().unwrap();
        let mut prefs = Preferences::open(temp_dir.path().join("prefs.toml")).unwrap();
        prefs.put_string(BACKUP_PATH_KEY, Some("/sdcard")).unwrap();

        PathStore::set(&mut prefs, BACKUP_PATH_KEY, Some("")).unwrap();

        assert!(!prefs.contains(BACKUP_PATH_KEY));
    }

    #[test]
    fn test_settings_sharing_a_store_see_each_others_writes() {
        let store = MemoryPathStore::with_value(BACKUP_PATH_KEY, "content://old/tree");
        let mut settings_screen = StoredPathSetting::load(Box::new(store.clone()));
        let main_screen = StoredPathSetting::load(Box::new(store));
        let target = StoredPath::parse("content://new/tree").unwrap();

        settings_screen.set(Some(&target));

        assert_eq!(main_screen.get(), Some(target));
    }

    #[test]
    fn test_shared_preferences_are_read_through() {
        let temp_dir = TempDir::new().unwrap();
        let prefs_path = temp_dir.path().join("prefs.toml");
        let target = StoredPath::Filesystem(PathBuf::from("/storage/emulated/0/BookShelf"));

        let mut writer = StoredPathSetting::load(Box::new(Preferences::shared(&prefs_path).unwrap()));
        let reader = StoredPathSetting::load(Box::new(Preferences::shared(&prefs_path).unwrap()));
        assert_eq!(reader.get(), None);

        writer.set(Some(&target));

        assert_eq!(reader.get(), Some(target));
    }
}
