//! Commands sent to an extension manager and the data they return.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What to do against each installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Uninstall,
    List,
    Help,
}

impl Action {
    /// The long command-line flag for this action, without its prefix.
    pub fn flag(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
            Self::List => "list",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "Install",
            Self::Uninstall => "Uninstall",
            Self::List => "List",
            Self::Help => "Help",
        };
        f.write_str(name)
    }
}

/// One command, built once per invocation and replayed against every
/// selected installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub action: Action,
    pub argument: Option<String>,
    pub root_suffix: String,
}

impl CommandRequest {
    pub fn new(action: Action, argument: Option<String>, root_suffix: impl Into<String>) -> Self {
        Self {
            action,
            argument,
            root_suffix: root_suffix.into(),
        }
    }

    pub fn install(path: impl Into<String>) -> Self {
        Self::new(Action::Install, Some(path.into()), "")
    }

    pub fn uninstall(identifier: impl Into<String>) -> Self {
        Self::new(Action::Uninstall, Some(identifier.into()), "")
    }

    pub fn list(filter: Option<String>) -> Self {
        Self::new(Action::List, filter, "")
    }

    pub fn with_root_suffix(mut self, root_suffix: impl Into<String>) -> Self {
        self.root_suffix = root_suffix.into();
        self
    }
}

/// Outcome of an install or uninstall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub succeeded: bool,
    pub message: String,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

/// One row of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedExtension {
    pub name: String,
    pub identifier: String,
}

/// Everything a command hands back across a boundary. Only data, never
/// handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    Completed(CommandResult),
    Listed { extensions: Vec<ListedExtension> },
    Help,
    /// Output of a child process that was relayed verbatim.
    Relayed { exit_code: Option<i32> },
}

impl CommandOutcome {
    /// False only for a failed install or uninstall, or a child that exited
    /// unsuccessfully.
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Completed(result) => result.succeeded,
            Self::Relayed { exit_code } => *exit_code == Some(0),
            Self::Listed { .. } | Self::Help => true,
        }
    }
}
