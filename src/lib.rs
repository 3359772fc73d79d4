//! Helpers for interacting with the snap system from within a snap.
//!
//! [`Snap`] bundles typed access to the snap environment, its paths, the
//! configuration store, services, health status and metadata files. All
//! runtime interaction goes through the `snapctl` control command.

pub mod cli;
pub mod config;
pub mod ctl;
pub mod env;
mod error;
pub mod health;
pub mod hook;
pub mod meta;
pub mod paths;
pub mod service;
pub mod snap;

#[cfg(test)]
mod testing;

pub use config::{ConfigTree, SnapConfig, SnapConfigOptions};
pub use ctl::{
    CommandOutput, CtlRunner, ProcessRunner, RefreshAction, ServiceInfo, SnapCtl,
    SnapHealthStatus,
};
pub use env::{is_snap, is_snap_in, SnapEnviron};
pub use error::{Result, SnapError};
pub use health::SnapHealth;
pub use hook::{Hook, HookRegistry};
pub use meta::{SnapMetadataFile, SnapMetadataFiles};
pub use paths::SnapPaths;
pub use service::{SnapService, SnapServices};
pub use snap::Snap;
