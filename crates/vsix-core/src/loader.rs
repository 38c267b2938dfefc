//! Module loading for one execution boundary.
//!
//! A [`ModuleLoader`] owns the probe and optional binding redirect of exactly
//! one boundary. It is passed explicitly to whoever needs to load vendor
//! modules; nothing is registered globally, so two boundaries can never see
//! each other's resolution rules.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::identity::ModuleIdentity;
use crate::probe::{AssemblyProbe, MODULE_EXTENSION};
use crate::redirect::BindingRedirect;

/// A module located on disk under its effective (post-redirect) identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub identity: ModuleIdentity,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModuleLoader {
    probe: AssemblyProbe,
    redirect: Option<BindingRedirect>,
    application_base: PathBuf,
}

impl ModuleLoader {
    /// Create a loader.
    ///
    /// `application_base` is the tool's own install directory; it is searched
    /// after the probe, standing in for the default load path.
    pub fn new(probe: AssemblyProbe, application_base: impl Into<PathBuf>) -> Self {
        Self {
            probe,
            redirect: None,
            application_base: application_base.into(),
        }
    }

    pub fn with_redirect(mut self, redirect: Option<BindingRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn probe(&self) -> &AssemblyProbe {
        &self.probe
    }

    pub fn redirect(&self) -> Option<&BindingRedirect> {
        self.redirect.as_ref()
    }

    pub fn application_base(&self) -> &Path {
        &self.application_base
    }

    /// The identity a request for `identity` is actually bound to.
    pub fn effective_identity(&self, identity: &ModuleIdentity) -> ModuleIdentity {
        match &self.redirect {
            Some(redirect) => redirect.apply(identity),
            None => identity.clone(),
        }
    }

    /// Locate a module: redirect, then probe, then the application base.
    pub fn load(&self, identity: &ModuleIdentity) -> Result<LoadedModule> {
        let effective = self.effective_identity(identity);

        if let Some(path) = self.probe.resolve(&effective.name) {
            return Ok(LoadedModule {
                identity: effective,
                path,
            });
        }

        let fallback = self
            .application_base
            .join(format!("{}.{}", effective.name, MODULE_EXTENSION));
        if fallback.is_file() {
            tracing::debug!(module = %effective.name, path = %fallback.display(), "Resolved module from application base");
            return Ok(LoadedModule {
                identity: effective,
                path: fallback,
            });
        }

        Err(Error::ModuleNotFound {
            name: effective.to_string(),
            base: self.probe.config().base_directory().to_path_buf(),
        })
    }
}
