//! Extension management for vsixutil.
//!
//! This crate binds the tool's calling convention to the extension manager
//! of one host version and runs commands against it:
//!
//! - [`ExtensionManager`], the capability every version provides
//! - [`LocalExtensionManager`], the filesystem-backed implementation
//! - [`VersionAdapter`], the per-version module table
//! - [`ExtensionManagerBinder`], which resolves modules through a boundary's loader
//! - [`CommandRunner`], which turns a request into console output and a result

pub mod adapter;
pub mod binder;
pub mod error;
pub mod manager;
pub mod package;
pub mod runner;
pub mod store;

pub use adapter::VersionAdapter;
pub use binder::ExtensionManagerBinder;
pub use error::{Error, Result};
pub use manager::{
    ExtensionHeader, ExtensionManager, HeaderOverride, InstallableExtension, InstalledExtension,
};
pub use runner::{CleanupOutcome, CommandRunner, execute};
pub use store::{LocalExtensionManager, SettingsStore};
