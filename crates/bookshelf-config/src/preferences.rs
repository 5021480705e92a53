use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;
use toml::{Table, Value};

#[derive(Debug, Error)]
pub enum PrefError {
    #[error("Failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write preferences at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// One store per file, shared by every user in the process.
pub type SharedPreferences = Arc<Mutex<Preferences>>;

static OPEN_STORES: OnceLock<Mutex<HashMap<PathBuf, SharedPreferences>>> = OnceLock::new();

/// App-scoped key/value preferences persisted as a flat TOML table.
///
/// Every `put_*`/`remove` writes the whole table back to disk. Getters never
/// fail: a missing key or a value of the wrong type yields the default.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    values: Table,
}

impl Preferences {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PrefError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self {
                path,
                values: Table::new(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|source| PrefError::Read {
            path: path.clone(),
            source,
        })?;
        let values: Table = toml::from_str(&content).map_err(|source| PrefError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, values })
    }

    /// Like [`Preferences::open`], but a file that does not parse opens as an
    /// empty store. The next write replaces it.
    pub fn open_or_reset<P: AsRef<Path>>(path: P) -> Result<Self, PrefError> {
        match Self::open(path) {
            Err(PrefError::Parse { path, source }) => {
                log::warn!(
                    "Discarding unreadable preferences at {}: {source}",
                    path.display()
                );
                Ok(Self {
                    path,
                    values: Table::new(),
                })
            }
            other => other,
        }
    }

    /// The process-wide store for `path`, opened with
    /// [`Preferences::open_or_reset`] on first use.
    pub fn shared<P: AsRef<Path>>(path: P) -> Result<SharedPreferences, PrefError> {
        let path = path.as_ref().to_path_buf();
        // Recover from poisoned mutex (another thread panicked while holding lock)
        let mut stores = OPEN_STORES
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(store) = stores.get(&path) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(Mutex::new(Self::open_or_reset(&path)?));
        stores.insert(path, Arc::clone(&store));
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn put_bool(&mut self, key: &str, value: bool) -> Result<(), PrefError> {
        self.put(key, Value::Boolean(value))
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values
            .get(key)
            .and_then(Value::as_integer)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn put_int(&mut self, key: &str, value: i32) -> Result<(), PrefError> {
        self.put(key, Value::Integer(i64::from(value)))
    }

    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(Value::as_integer)
            .unwrap_or(default)
    }

    pub fn put_long(&mut self, key: &str, value: i64) -> Result<(), PrefError> {
        self.put(key, Value::Integer(value))
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Store a string. `None` removes the key, as the platform store does.
    pub fn put_string(&mut self, key: &str, value: Option<&str>) -> Result<(), PrefError> {
        match value {
            Some(value) => self.put(key, Value::String(value.to_string())),
            None => self.remove(key),
        }
    }

    pub fn get_string_set(&self, key: &str) -> Option<BTreeSet<String>> {
        let items = self.values.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn put_string_set(&mut self, key: &str, value: &BTreeSet<String>) -> Result<(), PrefError> {
        let items = value.iter().cloned().map(Value::String).collect();
        self.put(key, Value::Array(items))
    }

    pub fn remove(&mut self, key: &str) -> Result<(), PrefError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn put(&mut self, key: &str, value: Value) -> Result<(), PrefError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<(), PrefError> {
        let write_err = |source| PrefError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content).map_err(write_err)
    }
}
