//! Core model for vsixutil.
//!
//! This crate holds everything that does not touch the vendor extension
//! manager itself:
//!
//! - [`HostVersion`] and [`InstalledVersion`], the installations being managed
//! - [`VersionCatalog`] implementations that discover installations on disk
//! - [`AssemblyProbe`] and [`ModuleLoader`], the per-boundary module resolver
//! - [`BindingRedirect`], the version remap attached to isolated boundaries
//! - [`ToolConfig`], the optional TOML configuration file
//! - [`ConsoleSink`], the output channel shared by every command

pub mod catalog;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod identity;
pub mod loader;
pub mod logging;
pub mod probe;
pub mod redirect;
pub mod version;

pub use catalog::{DirectoryCatalog, VersionCatalog, VersionFilter};
pub use command::{Action, CommandOutcome, CommandRequest, CommandResult, ListedExtension};
pub use config::ToolConfig;
pub use console::{BufferConsole, ConsoleSink, StdoutConsole};
pub use error::{Error, Result};
pub use identity::{ModuleIdentity, ModuleVersion};
pub use loader::{LoadedModule, ModuleLoader};
pub use probe::{AssemblyProbe, ProbeConfig};
pub use redirect::BindingRedirect;
pub use version::{HostVersion, InstalledVersion};

/// Usage text printed for `/help` and for argument errors.
pub const USAGE: &str = "\
vsixutil [/install] extensionPath [/version number] [/product name] [/sku names] [/rootSuffix name]
vsixutil /uninstall identifier [/version number] [/product name] [/sku names] [/rootSuffix name]
vsixutil /list [filter] [/version number] [/product name] [/sku names] [/rootSuffix name]";
