//! Re-running the tool as a separate process.
//!
//! Installing into the newest version needs its extension manager to run in
//! the tool's default boundary, so the tool starts a second copy of itself
//! restricted to that one installation and relays what it prints.

use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use vsix_core::{CommandOutcome, CommandRequest, ConsoleSink, InstalledVersion};

use crate::context::ToolEnvironment;
use crate::error::{Error, Result};

/// Arguments for the child invocation, in slash form.
///
/// The edition is passed as `/sku` so the child discovers the installation
/// even when the parent was given a `/sku` list of its own.
pub fn child_arguments(installed: &InstalledVersion, request: &CommandRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "/defaultDomain".into(),
        "/product".into(),
        installed.application_path().as_os_str().to_owned(),
    ];
    if let Some(product) = installed.product() {
        args.push("/sku".into());
        args.push(product.into());
    }
    args.push(format!("/{}", request.action.flag()).into());
    if let Some(argument) = &request.argument {
        args.push(argument.into());
    }
    if !request.root_suffix.is_empty() {
        args.push("/rootsuffix".into());
        args.push(request.root_suffix.as_str().into());
    }
    args
}

/// Run `request` in a child process and relay its stdout line by line.
///
/// Blocks until the child exits.
pub fn run_out_of_process(
    environment: &ToolEnvironment,
    installed: &InstalledVersion,
    request: &CommandRequest,
    console: &mut dyn ConsoleSink,
) -> Result<CommandOutcome> {
    let spawn_error = |source| Error::Spawn {
        program: environment.executable.clone(),
        source,
    };

    let mut child = Command::new(&environment.executable)
        .args(child_arguments(installed, request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(spawn_error)?;
    tracing::debug!(version = %installed.version(), pid = child.id(), "Started out-of-process run");

    let relayed = match child.stdout.take() {
        Some(stdout) => relay_lines(BufReader::new(stdout), console),
        None => Ok(()),
    };

    // Reap the child even when the relay broke off.
    let status = child.wait().map_err(spawn_error)?;
    relayed?;
    tracing::debug!(version = %installed.version(), %status, "Out-of-process run finished");
    Ok(CommandOutcome::Relayed {
        exit_code: status.code(),
    })
}

/// Copy `reader` to `console` line by line. Bytes that are not UTF-8 are
/// replaced rather than ending the relay.
fn relay_lines(mut reader: impl BufRead, console: &mut dyn ConsoleSink) -> Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(Error::Pipe)? == 0 {
            return Ok(());
        }
        let text = line.strip_suffix(b"\n").unwrap_or(&line[..]);
        let text = text.strip_suffix(b"\r").unwrap_or(text);
        console.write_line(&String::from_utf8_lossy(text));
    }
}
