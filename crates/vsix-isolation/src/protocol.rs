//! Line-delimited JSON spoken between the tool and an isolated boundary.
//!
//! The parent writes one [`BoundaryRequest`] per line to the child's stdin.
//! The child answers with a stream of [`BoundaryEvent`]s on stdout, ending in
//! `Completed` or `Failed`. Only data crosses: no handle, path resolver or
//! extension manager ever leaves the boundary that created it.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vsix_core::{CommandOutcome, CommandRequest, InstalledVersion, ProbeConfig};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryRequest {
    Run {
        installed: InstalledVersion,
        probe: ProbeConfig,
        settings_root: PathBuf,
        request: CommandRequest,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryEvent {
    Write { text: String },
    WriteLine { text: String },
    Completed { outcome: CommandOutcome },
    Failed { message: String },
}

/// Write one message and flush.
pub fn write_message<T: Serialize>(writer: &mut impl Write, message: &T) -> Result<()> {
    let line = serde_json::to_string(message)?;
    writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(Error::Pipe)
}

/// Read the next message. `None` at end of stream; blank lines are skipped.
pub fn read_message<T: DeserializeOwned>(reader: &mut impl BufRead) -> Result<Option<T>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).map_err(Error::Pipe)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return Ok(Some(serde_json::from_str(line.trim_end())?));
        }
    }
}
