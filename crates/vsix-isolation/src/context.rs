//! Execution boundaries.
//!
//! An [`IsolationContext`] is where one host version's modules are resolved
//! and its extension manager lives. A shared context runs in the tool's own
//! process with no binding redirect. An isolated context is a child process
//! of the tool, started in the tool's directory with its own probe and, for
//! every version but the oldest, its own redirect file.

use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use vsix_core::{
    AssemblyProbe, BindingRedirect, CommandOutcome, CommandRequest, ConsoleSink, InstalledVersion,
    ModuleLoader, ProbeConfig,
};

use crate::error::{Error, Result};
use crate::protocol::{BoundaryEvent, BoundaryRequest, read_message, write_message};

/// Flag that starts the executable as a boundary child.
pub const BOUNDARY_FLAG: &str = "--boundary";
/// Flag naming the redirect file of a boundary child.
pub const CONFIGURATION_FILE_FLAG: &str = "--configuration-file";

/// Where the tool runs from and where extension data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvironment {
    pub executable: PathBuf,
    pub base_directory: PathBuf,
    pub settings_root: PathBuf,
}

impl ToolEnvironment {
    pub fn new(
        executable: impl Into<PathBuf>,
        base_directory: impl Into<PathBuf>,
        settings_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            base_directory: base_directory.into(),
            settings_root: settings_root.into(),
        }
    }

    /// The running executable and its directory.
    ///
    /// The path is canonicalized without a verbatim prefix so it can be used
    /// as a child's working directory on every platform.
    pub fn current(settings_root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let executable = dunce::canonicalize(std::env::current_exe()?)?;
        let base_directory = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(executable, base_directory, settings_root))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Disposed,
}

/// Pipes to a running boundary child.
#[derive(Debug)]
pub(crate) struct ChildBoundary {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    configuration_file: Option<PathBuf>,
}

#[derive(Debug)]
pub(crate) enum Boundary {
    Shared,
    Isolated(ChildBoundary),
}

#[derive(Debug)]
pub struct IsolationContext {
    installed: InstalledVersion,
    environment: ToolEnvironment,
    probe: Option<ProbeConfig>,
    boundary: Boundary,
    state: LifecycleState,
}

impl IsolationContext {
    /// Create a context for `installed`.
    ///
    /// With `isolate`, a boundary child is started immediately, after its
    /// redirect file (if any) has been written.
    pub fn create(
        installed: &InstalledVersion,
        isolate: bool,
        environment: &ToolEnvironment,
    ) -> Result<Self> {
        let boundary = if isolate {
            Boundary::Isolated(spawn_boundary(installed, environment)?)
        } else {
            Boundary::Shared
        };

        tracing::debug!(version = %installed.version(), isolate, "Created isolation context");
        Ok(Self {
            installed: installed.clone(),
            environment: environment.clone(),
            probe: Some(ProbeConfig::for_installation(installed)),
            boundary,
            state: LifecycleState::Active,
        })
    }

    pub fn installed(&self) -> &InstalledVersion {
        &self.installed
    }

    pub fn is_isolated(&self) -> bool {
        matches!(self.boundary, Boundary::Isolated(_))
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The probe registered for this context. `None` once disposed.
    pub fn probe_config(&self) -> Option<&ProbeConfig> {
        self.probe.as_ref()
    }

    /// Redirect file attached to an isolated boundary.
    pub fn configuration_file(&self) -> Option<&Path> {
        match &self.boundary {
            Boundary::Isolated(child) => child.configuration_file.as_deref(),
            Boundary::Shared => None,
        }
    }

    /// Create an object that runs inside this context.
    ///
    /// The object borrows the context, so it cannot outlive it or be used
    /// across a [`dispose`](Self::dispose).
    pub fn create_remote<'a, T: RemoteObject<'a>>(&'a mut self) -> Result<T> {
        if self.state == LifecycleState::Disposed {
            return Err(Error::ContextDisposed);
        }
        Ok(T::attach(self))
    }

    /// Tear down the boundary and release the probe.
    ///
    /// Calling this twice is an error.
    pub fn dispose(&mut self) -> Result<()> {
        if self.state == LifecycleState::Disposed {
            return Err(Error::ContextDisposed);
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        self.probe = None;
        self.state = LifecycleState::Disposed;

        let boundary = std::mem::replace(&mut self.boundary, Boundary::Shared);
        if let Boundary::Isolated(mut child) = boundary {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = write_message(&mut stdin, &BoundaryRequest::Shutdown);
                let _ = stdin.flush();
            }
            match child.child.wait() {
                Ok(status) => {
                    tracing::debug!(version = %self.installed.version(), %status, "Boundary exited");
                }
                Err(e) => {
                    tracing::warn!(version = %self.installed.version(), error = %e, "Killing boundary");
                    let _ = child.child.kill();
                }
            }
        }
    }

    /// Run a command in this context.
    fn run_command(
        &mut self,
        request: &CommandRequest,
        console: &mut dyn ConsoleSink,
    ) -> Result<CommandOutcome> {
        let probe = self.probe.clone().ok_or(Error::ContextDisposed)?;
        let version = self.installed.version();

        match &mut self.boundary {
            Boundary::Shared => {
                let loader =
                    ModuleLoader::new(AssemblyProbe::new(probe), &self.environment.base_directory);
                Ok(vsix_extensions::execute(
                    &loader,
                    &self.environment.settings_root,
                    &self.installed,
                    request,
                    console,
                )?)
            }
            Boundary::Isolated(child) => {
                let stdin = child.stdin.as_mut().ok_or(Error::BoundaryExited(version))?;
                write_message(
                    stdin,
                    &BoundaryRequest::Run {
                        installed: self.installed.clone(),
                        probe,
                        settings_root: self.environment.settings_root.clone(),
                        request: request.clone(),
                    },
                )?;

                while let Some(event) = read_message::<BoundaryEvent>(&mut child.stdout)? {
                    match event {
                        BoundaryEvent::Write { text } => console.write(&text),
                        BoundaryEvent::WriteLine { text } => console.write_line(&text),
                        BoundaryEvent::Completed { outcome } => return Ok(outcome),
                        BoundaryEvent::Failed { message } => return Err(Error::Remote(message)),
                    }
                }
                Err(Error::BoundaryExited(version))
            }
        }
    }
}

impl Drop for IsolationContext {
    fn drop(&mut self) {
        if self.state == LifecycleState::Active {
            self.teardown();
        }
    }
}

fn spawn_boundary(installed: &InstalledVersion, environment: &ToolEnvironment) -> Result<ChildBoundary> {
    let version = installed.version();
    let creation = |reason: String| Error::BoundaryCreation { version, reason };

    if !environment.base_directory.is_dir() {
        return Err(creation(format!(
            "base directory {} does not exist",
            environment.base_directory.display()
        )));
    }

    let configuration_file = BindingRedirect::for_version(version)
        .map(|redirect| redirect.write_temporary())
        .transpose()?;

    let mut command = Command::new(&environment.executable);
    command
        .arg(BOUNDARY_FLAG)
        .current_dir(&environment.base_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if let Some(path) = &configuration_file {
        command.arg(CONFIGURATION_FILE_FLAG).arg(path);
    }

    let mut child = command.spawn().map_err(|e| {
        creation(format!(
            "cannot start {}: {}",
            environment.executable.display(),
            e
        ))
    })?;

    let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
        let _ = child.kill();
        return Err(creation("boundary pipes unavailable".to_string()));
    };

    tracing::debug!(%version, pid = child.id(), "Started boundary");
    Ok(ChildBoundary {
        child,
        stdin: Some(stdin),
        stdout: BufReader::new(stdout),
        configuration_file,
    })
}

/// Something that can be created inside an [`IsolationContext`].
pub trait RemoteObject<'a>: Sized {
    fn attach(context: &'a mut IsolationContext) -> Self;
}

/// Runs commands in the context it was created in.
pub struct RemoteCommandRunner<'a> {
    context: &'a mut IsolationContext,
}

impl<'a> RemoteObject<'a> for RemoteCommandRunner<'a> {
    fn attach(context: &'a mut IsolationContext) -> Self {
        Self { context }
    }
}

impl RemoteCommandRunner<'_> {
    pub fn run(
        &mut self,
        request: &CommandRequest,
        console: &mut dyn ConsoleSink,
    ) -> Result<CommandOutcome> {
        self.context.run_command(request, console)
    }
}
