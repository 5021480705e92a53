//! Backup and restore location resolution.
//!
//! The heart of this crate is [`BackupRestoreFlow`]: given the last stored
//! backup folder and what the device allows, it decides whether to run a
//! backup/restore straight away, ask for storage permission, or ask the user
//! to pick a folder. Everything it talks to (pickers, permission dialogs,
//! the engines that actually move data) sits behind the traits in
//! [`platform`] and [`engine`], and every platform callback comes back in as
//! a [`UiEvent`].

pub mod context;
pub mod engine;
pub mod event;
pub mod flow;
pub mod messages;
pub mod path;
pub mod pending;
pub mod platform;
pub mod request;
pub mod setting;

// Re-export key types for easier usage
pub use engine::*;
pub use event::*;
pub use flow::*;
pub use path::*;
pub use pending::*;
pub use platform::*;
pub use request::*;
pub use setting::*;
