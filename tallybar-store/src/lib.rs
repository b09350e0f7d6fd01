// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `TallyBar` Store
//!
//! State management for the `TallyBar` application.
//!
//! This crate provides:
//!
//! - **RefreshController**: Single-flight fetch state machine with a poll
//!   timer, published through a watch channel
//! - **SnapshotStore**: Last good snapshot, cached on disk
//! - **ConfigStore**: Username, allowance, and poll interval
//! - **Credentials**: Token access through the secret store
//! - **Scheduler**: Timer abstraction (tokio or virtual time)
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use tallybar_store::{RefreshController, RefreshDeps};
//!
//! let controller = RefreshController::new(deps);
//! controller.start().await;
//!
//! // Subscribe to changes
//! let mut rx = controller.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("{:?}", rx.borrow().state);
//! }
//! ```

pub mod config_store;
pub mod credentials;
pub mod error;
pub mod persistence;
pub mod refresh;
pub mod scheduler;
pub mod snapshot_store;

pub use config_store::{
    AppConfig, ConfigStore, DEFAULT_REFRESH_INTERVAL_MINUTES, FileConfigStore, MemoryConfigStore,
};
pub use credentials::GITHUB_TOKEN_KEY;
pub use error::StoreError;
pub use persistence::{
    default_config_dir, default_config_path, default_data_dir, default_snapshot_path, load_json,
    load_json_or_default, save_json,
};
pub use refresh::{RefreshController, RefreshDeps, RefreshState, RefreshStatus};
pub use scheduler::{ManualScheduler, ScheduledTask, Scheduler, TimerTask, TokioScheduler};
pub use snapshot_store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
