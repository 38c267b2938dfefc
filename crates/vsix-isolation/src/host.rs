//! The child side of an isolated boundary.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use vsix_core::{AssemblyProbe, BindingRedirect, ConsoleSink, ModuleLoader};
use vsix_extensions::execute;

use crate::error::Result;
use crate::protocol::{BoundaryEvent, BoundaryRequest, read_message, write_message};

/// Forwards console output to the parent as protocol events.
struct ProtocolConsole<W: Write> {
    output: W,
    broken: bool,
}

impl<W: Write> ProtocolConsole<W> {
    fn send(&mut self, event: BoundaryEvent) {
        if self.broken {
            return;
        }
        if let Err(e) = write_message(&mut self.output, &event) {
            tracing::warn!(error = %e, "Lost connection to parent");
            self.broken = true;
        }
    }
}

impl<W: Write> ConsoleSink for ProtocolConsole<W> {
    fn write(&mut self, text: &str) {
        self.send(BoundaryEvent::Write {
            text: text.to_string(),
        });
    }

    fn write_line(&mut self, text: &str) {
        self.send(BoundaryEvent::WriteLine {
            text: text.to_string(),
        });
    }
}

/// Serve requests until `Shutdown` or end of input.
///
/// `configuration_file` is the binding redirect attached to this boundary;
/// it is read when the first command arrives. `application_base` is the
/// tool's own directory, searched after the probe.
pub fn serve_boundary(
    configuration_file: Option<&Path>,
    application_base: &Path,
    mut input: impl BufRead,
    output: impl Write,
) -> Result<()> {
    let mut console = ProtocolConsole {
        output,
        broken: false,
    };
    let mut redirect: Option<Option<BindingRedirect>> = None;

    while let Some(message) = read_message::<BoundaryRequest>(&mut input)? {
        let (installed, probe, settings_root, request) = match message {
            BoundaryRequest::Shutdown => break,
            BoundaryRequest::Run {
                installed,
                probe,
                settings_root,
                request,
            } => (installed, probe, settings_root, request),
        };

        if redirect.is_none() {
            match configuration_file.map(BindingRedirect::load).transpose() {
                Ok(loaded) => redirect = Some(loaded),
                Err(e) => {
                    console.send(BoundaryEvent::Failed {
                        message: e.to_string(),
                    });
                    continue;
                }
            }
        }

        let loader = ModuleLoader::new(AssemblyProbe::new(probe), PathBuf::from(application_base))
            .with_redirect(redirect.clone().flatten());
        tracing::debug!(version = %installed.version(), action = %request.action, "Boundary running command");

        let event = match execute(&loader, &settings_root, &installed, &request, &mut console) {
            Ok(outcome) => BoundaryEvent::Completed { outcome },
            Err(e) => BoundaryEvent::Failed {
                message: e.to_string(),
            },
        };
        console.send(event);
    }

    tracing::debug!("Boundary shutting down");
    Ok(())
}
