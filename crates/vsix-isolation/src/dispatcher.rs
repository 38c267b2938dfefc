//! Runs one command against every selected installation in turn.

use vsix_core::{Action, CommandOutcome, CommandRequest, ConsoleSink, HostVersion, InstalledVersion};

use crate::context::{IsolationContext, RemoteCommandRunner, ToolEnvironment};
use crate::error::Result;
use crate::out_of_process::run_out_of_process;

/// How a command reaches one installation's extension manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// In the tool's own process, without a redirect.
    Shared,
    /// In a boundary child with its own probe and redirect.
    Isolated,
    /// In a second copy of the tool, run in shared mode.
    OutOfProcess,
}

impl ExecutionMode {
    pub fn for_version(version: HostVersion, action: Action, default_domain: bool) -> Self {
        if default_domain {
            return Self::Shared;
        }
        match version {
            HostVersion::Vs2017 if action == Action::Install => Self::OutOfProcess,
            HostVersion::Vs2017 => Self::Shared,
            HostVersion::Vs2010 | HostVersion::Vs2012 | HostVersion::Vs2013 | HostVersion::Vs2015 => {
                Self::Isolated
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFailure {
    pub installed: InstalledVersion,
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<(InstalledVersion, CommandOutcome)>,
    pub failures: Vec<VersionFailure>,
}

impl DispatchReport {
    /// True when every version ran and every command succeeded.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.outcomes.iter().all(|(_, outcome)| outcome.succeeded())
    }
}

pub struct Dispatcher<'a> {
    environment: &'a ToolEnvironment,
    default_domain: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(environment: &'a ToolEnvironment) -> Self {
        Self {
            environment,
            default_domain: false,
        }
    }

    /// Force every version into the shared boundary.
    pub fn with_default_domain(mut self, default_domain: bool) -> Self {
        self.default_domain = default_domain;
        self
    }

    /// Run `request` against each installation in order.
    ///
    /// A failure for one installation is printed and recorded, and the next
    /// one still runs.
    pub fn run(
        &self,
        versions: &[InstalledVersion],
        request: &CommandRequest,
        console: &mut dyn ConsoleSink,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for installed in versions {
            match self.run_one(installed, request, console) {
                Ok(outcome) => report.outcomes.push((installed.clone(), outcome)),
                Err(e) => {
                    tracing::error!(version = %installed.version(), error = %e, "Command failed");
                    console.write_line(&format!("Error: {}", e));
                    report.failures.push(VersionFailure {
                        installed: installed.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    fn run_one(
        &self,
        installed: &InstalledVersion,
        request: &CommandRequest,
        console: &mut dyn ConsoleSink,
    ) -> Result<CommandOutcome> {
        let mode = ExecutionMode::for_version(installed.version(), request.action, self.default_domain);
        tracing::debug!(version = %installed.version(), ?mode, "Dispatching");

        if mode == ExecutionMode::OutOfProcess {
            return run_out_of_process(self.environment, installed, request, console);
        }

        let mut context =
            IsolationContext::create(installed, mode == ExecutionMode::Isolated, self.environment)?;
        let outcome = context
            .create_remote::<RemoteCommandRunner>()
            .and_then(|mut runner| runner.run(request, console));
        let disposed = context.dispose();

        let outcome = outcome?;
        disposed?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vsix_core::BufferConsole;
    use vsix_test_utils::FakeHost;

    #[rstest]
    #[case(HostVersion::Vs2010, Action::List, false, ExecutionMode::Isolated)]
    #[case(HostVersion::Vs2015, Action::Install, false, ExecutionMode::Isolated)]
    #[case(HostVersion::Vs2017, Action::Install, false, ExecutionMode::OutOfProcess)]
    #[case(HostVersion::Vs2017, Action::Uninstall, false, ExecutionMode::Shared)]
    #[case(HostVersion::Vs2017, Action::List, false, ExecutionMode::Shared)]
    #[case(HostVersion::Vs2017, Action::Install, true, ExecutionMode::Shared)]
    #[case(HostVersion::Vs2012, Action::Uninstall, true, ExecutionMode::Shared)]
    fn test_execution_mode(
        #[case] version: HostVersion,
        #[case] action: Action,
        #[case] default_domain: bool,
        #[case] expected: ExecutionMode,
    ) {
        assert_eq!(ExecutionMode::for_version(version, action, default_domain), expected);
    }

    #[test]
    fn test_failure_for_one_version_does_not_stop_the_next() {
        let host = FakeHost::new();
        let broken = host.add_legacy_without_modules(HostVersion::Vs2013);
        let working = host.add_sku("Community");
        let environment = ToolEnvironment::new(
            host.root().join("vsixutil"),
            host.root(),
            host.settings_root(),
        );

        let mut console = BufferConsole::new();
        let report = Dispatcher::new(&environment).with_default_domain(true).run(
            &[broken.clone(), working.clone()],
            &CommandRequest::list(None),
            &mut console,
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].installed, broken);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].0, working);
        assert!(!report.succeeded());

        let lines = console.lines();
        assert!(lines[0].starts_with("Error: "));
        assert!(lines.iter().any(|l| l.ends_with("(Vs2017)")));
    }

    #[test]
    fn test_isolated_creation_failure_is_reported() {
        let host = FakeHost::new();
        let installed = host.add_legacy(HostVersion::Vs2010);
        let environment = ToolEnvironment::new(
            host.root().join("no-such-exe"),
            host.root(),
            host.settings_root(),
        );

        let mut console = BufferConsole::new();
        let report = Dispatcher::new(&environment).run(&[installed], &CommandRequest::list(None), &mut console);

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.starts_with("failed to create boundary for Vs2010"));
        assert!(console.contents().starts_with("Error: failed to create boundary"));
    }

    #[test]
    fn test_empty_selection_does_nothing() {
        let host = FakeHost::new();
        let environment = ToolEnvironment::new(host.root().join("x"), host.root(), host.settings_root());
        let mut console = BufferConsole::new();

        let report = Dispatcher::new(&environment).run(&[], &CommandRequest::list(None), &mut console);
        assert!(report.succeeded());
        assert_eq!(console.contents(), "");
    }
}
