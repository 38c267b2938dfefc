//! Shared test utilities for the vsixutil workspace.
//!
//! This crate provides standardised fixtures so crate test suites don't each
//! fake their own host installations. It is a dev-dependency only and never
//! published.
//!
//! # Modules
//!
//! - [`host`]: [`FakeHost`], a temporary Program Files tree with installations
//! - [`vsix`]: [`VsixBuilder`], writes extension packages in either manifest schema

pub mod host;
pub mod vsix;

pub use host::{FakeHost, install_vendor_modules, vendor_module_names};
pub use vsix::{ManifestSchema, VsixBuilder};
