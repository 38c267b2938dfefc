//! Executes one command against one bound extension manager.
//!
//! Install and uninstall failures are reported on the console and in the
//! returned [`CommandResult`]; they never propagate as errors.

use std::path::Path;

use regex::RegexBuilder;
use vsix_core::{
    Action, CommandOutcome, CommandRequest, CommandResult, ConsoleSink, InstalledVersion,
    ListedExtension, ModuleLoader, USAGE,
};

use crate::binder::ExtensionManagerBinder;
use crate::error::{Error, Result};
use crate::manager::{ExtensionManager, HeaderOverride};

/// Longest name shown in a listing before it is cut.
const MAX_NAME_LENGTH: usize = 35;

/// What the pre-install cleanup did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    Absent,
    /// The cleanup failed; the install goes ahead regardless.
    Ignored(String),
}

pub struct CommandRunner<'a> {
    manager: &'a mut dyn ExtensionManager,
    installed: &'a InstalledVersion,
    console: &'a mut dyn ConsoleSink,
}

impl<'a> CommandRunner<'a> {
    pub fn new(
        manager: &'a mut dyn ExtensionManager,
        installed: &'a InstalledVersion,
        console: &'a mut dyn ConsoleSink,
    ) -> Self {
        Self {
            manager,
            installed,
            console,
        }
    }

    pub fn run(&mut self, request: &CommandRequest) -> CommandOutcome {
        let argument = request.argument.as_deref();
        match request.action {
            Action::Install => CommandOutcome::Completed(self.install(argument)),
            Action::Uninstall => CommandOutcome::Completed(self.uninstall(argument)),
            Action::List => self.list(argument),
            Action::Help => {
                print_usage(self.console);
                CommandOutcome::Help
            }
        }
    }

    fn install(&mut self, path: Option<&str>) -> CommandResult {
        self.console
            .write(&format!("{} Install ... ", self.installed.version()));

        let result = match path {
            Some(path) => self.try_install(Path::new(path)),
            None => Err("no extension path given".to_string()),
        };
        self.finish(result)
    }

    fn try_install(&mut self, path: &Path) -> std::result::Result<(), String> {
        let mut installable = self
            .manager
            .create_installable(path)
            .map_err(|e| e.to_string())?;
        let identifier = installable.header.identifier.clone();

        let cleanup = self.uninstall_silent(&identifier);
        tracing::debug!(%identifier, ?cleanup, "Pre-install cleanup");

        let per_machine = false;
        if installable.header.all_users != per_machine {
            match self.manager.override_all_users(&mut installable, per_machine) {
                HeaderOverride::Applied => self.console.write(&format!(
                    "NOTE: Changing `AllUsers` to {} ... ",
                    per_machine
                )),
                HeaderOverride::Unsupported => self.console.write(&format!(
                    "WARNING: Couldn't change `AllUsers` to {} ... ",
                    per_machine
                )),
            }
        }

        self.manager
            .install(&installable, per_machine)
            .map_err(|e| e.to_string())?;

        let installed = self
            .manager
            .get_installed(&identifier)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| Error::NotInstalled(identifier.clone()).to_string())?;
        self.manager.enable(&installed).map_err(|e| e.to_string())
    }

    fn uninstall(&mut self, identifier: Option<&str>) -> CommandResult {
        self.console
            .write(&format!("{} Uninstall ... ", self.installed.version()));

        let Some(identifier) = identifier else {
            return self.finish(Err("no identifier given".to_string()));
        };

        match self.manager.get_installed(identifier) {
            Ok(None) => {
                self.console.write_line("not installed");
                CommandResult::success("not installed")
            }
            Ok(Some(installed)) => {
                let result = self.manager.uninstall(&installed).map_err(|e| e.to_string());
                self.finish(result)
            }
            Err(e) => self.finish(Err(e.to_string())),
        }
    }

    fn finish(&mut self, result: std::result::Result<(), String>) -> CommandResult {
        match result {
            Ok(()) => {
                self.console.write_line("Succeeded");
                CommandResult::success("Succeeded")
            }
            Err(message) => {
                tracing::warn!(version = %self.installed.version(), %message, "Command failed");
                self.console.write_line(&format!("ERROR: {}", message));
                CommandResult::failure(message)
            }
        }
    }

    /// Remove `identifier` if present, swallowing any failure.
    pub fn uninstall_silent(&mut self, identifier: &str) -> CleanupOutcome {
        let installed = match self.manager.get_installed(identifier) {
            Ok(Some(installed)) => installed,
            Ok(None) => return CleanupOutcome::Absent,
            Err(e) => return CleanupOutcome::Ignored(e.to_string()),
        };
        match self.manager.uninstall(&installed) {
            Ok(()) => CleanupOutcome::Removed,
            Err(e) => CleanupOutcome::Ignored(e.to_string()),
        }
    }

    fn list(&mut self, filter: Option<&str>) -> CommandOutcome {
        self.console.write_line("");
        self.console.write_line(&format!(
            "{} ({})",
            self.installed.application_path().display(),
            self.installed.version()
        ));
        self.console
            .write_line(&format!("  {:<40} - {}", "Name", "Identifier"));

        let regex = match filter {
            Some(pattern) => match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => Some(regex),
                Err(source) => {
                    let error = Error::InvalidFilter {
                        pattern: pattern.to_string(),
                        source,
                    };
                    self.console.write_line(&format!("ERROR: {}", error));
                    return CommandOutcome::Completed(CommandResult::failure(error.to_string()));
                }
            },
            None => None,
        };

        let installed = match self.manager.list_installed() {
            Ok(installed) => installed,
            Err(e) => {
                self.console.write_line(&format!("ERROR: {}", e));
                return CommandOutcome::Completed(CommandResult::failure(e.to_string()));
            }
        };

        let mut extensions = Vec::new();
        for extension in installed {
            let header = extension.header;
            if regex.as_ref().is_some_and(|r| !r.is_match(&header.name)) {
                continue;
            }
            let name = display_name(&header.name);
            self.console
                .write_line(&format!("  {:<40} - {}", name, header.identifier));
            extensions.push(ListedExtension {
                name,
                identifier: header.identifier,
            });
        }

        CommandOutcome::Listed { extensions }
    }
}

/// Flatten line breaks and cut long names.
pub fn display_name(name: &str) -> String {
    let flat = name.replace("\r\n", " ").replace('\n', " ");
    if flat.chars().count() > MAX_NAME_LENGTH {
        let cut: String = flat.chars().take(MAX_NAME_LENGTH).collect();
        format!("{} ...", cut)
    } else {
        flat
    }
}

pub fn print_usage(console: &mut dyn ConsoleSink) {
    for line in USAGE.lines() {
        console.write_line(line);
    }
}

/// Bind the extension manager for `installed` through `loader` and run
/// `request` against it.
///
/// This is the body of a command runner inside a boundary: only the
/// returned data leaves it.
pub fn execute(
    loader: &ModuleLoader,
    settings_root: &Path,
    installed: &InstalledVersion,
    request: &CommandRequest,
    console: &mut dyn ConsoleSink,
) -> Result<CommandOutcome> {
    if request.action == Action::Help {
        print_usage(console);
        return Ok(CommandOutcome::Help);
    }

    let mut manager = ExtensionManagerBinder::new(loader, settings_root).bind(
        installed.version(),
        installed.application_path(),
        &request.root_suffix,
    )?;
    Ok(CommandRunner::new(&mut manager, installed, console).run(request))
}
