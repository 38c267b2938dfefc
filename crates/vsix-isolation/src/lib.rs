//! Execution boundaries and per-version dispatch for vsixutil.
//!
//! Each host version's extension manager needs its own module resolution.
//! This crate decides where each command runs ([`ExecutionMode`]) and owns
//! the boundaries it runs in:
//!
//! - [`IsolationContext`], shared or isolated in a child process
//! - [`serve_boundary`], the child's side of the [`protocol`]
//! - [`run_out_of_process`], the fallback that re-runs the tool
//! - [`Dispatcher`], which visits every selected installation

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod out_of_process;
pub mod protocol;

pub use context::{
    BOUNDARY_FLAG, CONFIGURATION_FILE_FLAG, IsolationContext, LifecycleState, RemoteCommandRunner,
    RemoteObject, ToolEnvironment,
};
pub use dispatcher::{DispatchReport, Dispatcher, ExecutionMode, VersionFailure};
pub use error::{Error, Result};
pub use host::serve_boundary;
pub use out_of_process::run_out_of_process;
