//! Configuration and preference storage for bookshelf-backup.
//!
//! [`Config`] holds the few settings the backup flow needs that are not user
//! choices (default legacy folder, SDK threshold). [`Preferences`] is the
//! key/value store the app keeps its user choices in, such as the last
//! selected backup folder.

mod config;
mod preferences;

pub use config::{Config, ConfigError};
pub use preferences::{PrefError, Preferences, SharedPreferences};
