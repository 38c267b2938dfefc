//! CLI argument parsing using clap derive
//!
//! The tool takes Windows-style slash options (`/install`, `/L`, ...). They
//! are rewritten to clap long options before parsing; anything that is not
//! a known option, such as an absolute Unix path, is passed through as is.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use clap::Parser;
use vsix_core::{Action, CommandRequest, VersionFilter};

use crate::error::{CliError, Result};

/// Manage extensions across side-by-side host installations
#[derive(Parser, Debug)]
#[command(name = "vsixutil", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Install the extension package at PATH
    #[arg(short = 'i', long, value_name = "PATH")]
    pub install: Option<String>,

    /// Uninstall the extension with IDENTIFIER
    #[arg(short = 'u', long, value_name = "IDENTIFIER")]
    pub uninstall: Option<String>,

    /// List installed extensions, optionally filtered by a name pattern
    #[arg(short = 'l', long, num_args = 0..=1, value_name = "FILTER")]
    pub list: Option<Option<String>>,

    /// Only act on this version (major number or year)
    #[arg(short = 'v', long, value_name = "NUMBER")]
    pub version: Option<String>,

    /// Only act on installations matching this product name or path
    #[arg(short = 'p', long, value_name = "NAME")]
    pub product: Option<String>,

    /// 2017 editions to look for, separated by `;`
    #[arg(short = 's', long, value_delimiter = ';', value_name = "NAMES")]
    pub sku: Option<Vec<String>>,

    /// Settings hive suffix, e.g. `Exp`
    #[arg(short = 'r', long = "rootsuffix", value_name = "NAME", default_value = "")]
    pub root_suffix: String,

    #[arg(short = 'h', long)]
    pub help: bool,

    /// Run every version in the tool's own process
    #[arg(long = "default-domain", hide = true)]
    pub default_domain: bool,

    /// Serve commands for an isolated boundary over stdin/stdout
    #[arg(long, hide = true)]
    pub boundary: bool,

    /// Binding redirect for the boundary
    #[arg(long = "configuration-file", hide = true, requires = "boundary")]
    pub configuration_file: Option<PathBuf>,

    /// Extension package to install
    #[arg(value_name = "EXTENSION")]
    pub extension: Option<String>,
}

/// Slash options and the long option each one maps to.
const SLASH_OPTIONS: &[(&[&str], &str)] = &[
    (&["i", "install"], "--install"),
    (&["u", "uninstall"], "--uninstall"),
    (&["l", "list"], "--list"),
    (&["v", "version"], "--version"),
    (&["p", "product"], "--product"),
    (&["s", "sku"], "--sku"),
    (&["r", "rootsuffix"], "--rootsuffix"),
    (&["help", "?"], "--help"),
    (&["defaultdomain"], "--default-domain"),
];

fn translate(arg: &OsStr) -> Option<&'static str> {
    let name = arg.to_str()?.strip_prefix('/')?.to_ascii_lowercase();
    SLASH_OPTIONS
        .iter()
        .find(|(names, _)| names.contains(&name.as_str()))
        .map(|(_, long)| *long)
}

/// Rewrite slash options to clap long options.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match translate(&arg) {
            Some(long) => OsString::from(long),
            None => arg,
        })
        .collect()
}

/// A fully interpreted command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    /// Child side of an isolated boundary.
    Boundary { configuration_file: Option<PathBuf> },
    Run(CommandLine),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub request: CommandRequest,
    pub filter: VersionFilter,
    pub skus: Option<Vec<String>>,
    pub default_domain: bool,
}

impl Invocation {
    /// Interpret parsed arguments.
    ///
    /// A bare argument must name an existing file and means install. More
    /// than one action is an error.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.boundary {
            return Ok(Self::Boundary {
                configuration_file: cli.configuration_file,
            });
        }
        if cli.help {
            return Ok(Self::Help);
        }

        let bare = match cli.extension {
            Some(arg) if !Path::new(&arg).is_file() => {
                return Err(CliError::user(format!("{} is not a valid argument", arg)));
            }
            other => other,
        };

        let mut actions = Vec::new();
        if let Some(path) = cli.install {
            actions.push((Action::Install, Some(path)));
        }
        if let Some(identifier) = cli.uninstall {
            actions.push((Action::Uninstall, Some(identifier)));
        }
        if let Some(filter) = cli.list {
            actions.push((Action::List, filter));
        }
        if let Some(path) = bare {
            actions.push((Action::Install, Some(path)));
        }

        if actions.len() > 1 {
            return Err(CliError::user(
                "only one of /install, /uninstall or /list may be given",
            ));
        }
        let Some((action, argument)) = actions.pop() else {
            return Ok(Self::Help);
        };

        Ok(Self::Run(CommandLine {
            request: CommandRequest::new(action, argument, cli.root_suffix),
            filter: VersionFilter::new(cli.version, cli.product),
            skus: cli.sku,
            default_domain: cli.default_domain,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Invocation> {
        let normalized = normalize_args(std::iter::once("vsixutil").chain(args.iter().copied()));
        let cli = Cli::try_parse_from(normalized).map_err(|e| CliError::user(e.to_string()))?;
        Invocation::from_cli(cli)
    }

    fn run_line(args: &[&str]) -> CommandLine {
        match parse(args).unwrap() {
            Invocation::Run(line) => line,
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[rstest]
    #[case("/i", "--install")]
    #[case("/INSTALL", "--install")]
    #[case("/u", "--uninstall")]
    #[case("/List", "--list")]
    #[case("/v", "--version")]
    #[case("/product", "--product")]
    #[case("/RootSuffix", "--rootsuffix")]
    #[case("/defaultDomain", "--default-domain")]
    #[case("/help", "--help")]
    fn test_slash_options_are_translated(#[case] arg: &str, #[case] expected: &str) {
        assert_eq!(normalize_args([arg]), vec![OsString::from(expected)]);
    }

    #[rstest]
    #[case("/tmp/ext.vsix")]
    #[case("/opt/vs/devenv.exe")]
    #[case("ext.vsix")]
    #[case("--boundary")]
    fn test_other_arguments_pass_through(#[case] arg: &str) {
        assert_eq!(normalize_args([arg]), vec![OsString::from(arg)]);
    }

    #[rstest]
    #[case(&["/i", "foo.vsix"], Action::Install, Some("foo.vsix"))]
    #[case(&["/install", "foo.vsix"], Action::Install, Some("foo.vsix"))]
    #[case(&["/u", "myid"], Action::Uninstall, Some("myid"))]
    #[case(&["/uninstall", "myid"], Action::Uninstall, Some("myid"))]
    #[case(&["/l", "search"], Action::List, Some("search"))]
    #[case(&["/list"], Action::List, None)]
    fn test_actions(#[case] args: &[&str], #[case] action: Action, #[case] argument: Option<&str>) {
        let line = run_line(args);
        assert_eq!(line.request.action, action);
        assert_eq!(line.request.argument.as_deref(), argument);
    }

    #[test]
    fn test_no_arguments_is_help() {
        assert_eq!(parse(&[]).unwrap(), Invocation::Help);
        assert_eq!(parse(&["/help"]).unwrap(), Invocation::Help);
        assert_eq!(parse(&["/v", "15"]).unwrap(), Invocation::Help);
    }

    #[test]
    fn test_missing_option_value_is_error() {
        assert!(parse(&["/install"]).is_err());
        assert!(parse(&["/uninstall"]).is_err());
        assert!(parse(&["/list", "/version"]).is_err());
    }

    #[test]
    fn test_selection_options() {
        let line = run_line(&["/list", "/v", "15", "/p", "Community", "/r", "Exp"]);
        assert_eq!(
            line.filter,
            VersionFilter::new(Some("15".to_string()), Some("Community".to_string()))
        );
        assert_eq!(line.request.root_suffix, "Exp");
        assert_eq!(line.request.argument, None);
        assert!(!line.default_domain);
    }

    #[test]
    fn test_sku_list() {
        let line = run_line(&["/l", "/sku", "Enterprise;Professional"]);
        assert_eq!(
            line.skus,
            Some(vec!["Enterprise".to_string(), "Professional".to_string()])
        );
    }

    #[test]
    fn test_bare_existing_file_means_install() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("ext.vsix");
        fs::write(&package, b"").unwrap();
        let package = package.to_string_lossy().to_string();

        let line = run_line(&[package.as_str()]);
        assert_eq!(line.request.action, Action::Install);
        assert_eq!(line.request.argument, Some(package));
    }

    #[test]
    fn test_bare_missing_file_is_invalid() {
        let err = parse(&["missing.vsix"]).unwrap_err();
        assert_eq!(err.to_string(), "missing.vsix is not a valid argument");
    }

    #[test]
    fn test_conflicting_actions_are_rejected() {
        assert!(parse(&["/i", "a.vsix", "/u", "a"]).is_err());
    }

    #[test]
    fn test_out_of_process_arguments_parse() {
        let line = run_line(&[
            "/defaultDomain",
            "/product",
            "/vs/2017/Community/Common7/IDE/devenv.exe",
            "/install",
            "/tmp/ext.vsix",
            "/rootsuffix",
            "Exp",
        ]);
        assert!(line.default_domain);
        assert_eq!(line.request.action, Action::Install);
        assert_eq!(line.request.argument.as_deref(), Some("/tmp/ext.vsix"));
        assert_eq!(
            line.filter.product.as_deref(),
            Some("/vs/2017/Community/Common7/IDE/devenv.exe")
        );
    }

    #[test]
    fn test_boundary_mode() {
        assert_eq!(
            parse(&["--boundary", "--configuration-file", "/tmp/r.config"]).unwrap(),
            Invocation::Boundary {
                configuration_file: Some(PathBuf::from("/tmp/r.config"))
            }
        );
        assert!(parse(&["--configuration-file", "/tmp/r.config"]).is_err());
    }
}
