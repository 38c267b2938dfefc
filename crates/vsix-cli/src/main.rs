//! vsixutil
//!
//! Installs, uninstalls and lists extensions in every installed version of
//! the host IDE.

mod cli;
mod error;

use std::io::Write;

use clap::Parser;
use colored::Colorize;
use vsix_core::{ConsoleSink, DirectoryCatalog, StdoutConsole, ToolConfig, USAGE, VersionCatalog};
use vsix_isolation::{Dispatcher, ToolEnvironment, serve_boundary};

use cli::{Cli, CommandLine, Invocation, normalize_args};
use error::{CliError, Result};

fn main() {
    if let Err(e) = vsix_core::logging::init() {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args = normalize_args(std::env::args_os());
    let invocation = match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::from_cli(cli),
        Err(e) => Err(CliError::user(e.kind().to_string())),
    };

    match invocation {
        Ok(Invocation::Run(command_line)) => {
            execute(command_line)?;
            Ok(0)
        }
        Ok(Invocation::Boundary { configuration_file }) => {
            let base = std::env::current_dir()?;
            serve_boundary(
                configuration_file.as_deref(),
                &base,
                std::io::stdin().lock(),
                std::io::stdout().lock(),
            )?;
            Ok(0)
        }
        Ok(Invocation::Help) => {
            print_usage();
            Ok(1)
        }
        Err(CliError::User { message }) => {
            let mut console = StdoutConsole;
            console.write_line(&message);
            print_usage();
            Ok(1)
        }
        Err(e) => Err(e),
    }
}

fn print_usage() {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", USAGE);
}

fn execute(command_line: CommandLine) -> Result<()> {
    let mut config = ToolConfig::discover()?;
    if let Some(skus) = command_line.skus {
        config.skus = Some(skus);
    }

    let discovered = DirectoryCatalog::from_config(&config).installed_versions()?;
    let versions = command_line.filter.apply(discovered);
    tracing::debug!(count = versions.len(), action = %command_line.request.action, "Selected installations");

    let environment = ToolEnvironment::current(config.settings_root())?;
    let mut console = StdoutConsole;
    let report = Dispatcher::new(&environment)
        .with_default_domain(command_line.default_domain)
        .run(&versions, &command_line.request, &mut console);

    if !report.failures.is_empty() {
        tracing::warn!(failed = report.failures.len(), "Some installations failed");
    }
    Ok(())
}
