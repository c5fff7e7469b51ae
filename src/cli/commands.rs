//! CLI command implementations.
//!
//! `inspect` is the diagnostics consumer of the descriptor layer: it
//! streams a log file and prints one line per record, with no effect on
//! the log or on any page. Unknown kinds under a known access method
//! print as unknown and do not stop the walk; an unknown access method
//! means the stream is from an incompatible build and does.

use std::io::Write;
use std::path::Path;

use crate::describe;
use crate::dispatch::Registry;
use crate::frame::FrameReader;
use crate::record::{self, RecordKind};

use super::errors::{CliError, CliResult};

/// Streams a log file and writes one diagnostics line per record.
pub fn inspect(log_path: &Path, json: bool, out: &mut impl Write) -> CliResult<()> {
    let registry = Registry::new();
    let mut reader = FrameReader::open(log_path)?;

    while let Some(frame) = reader.read_next()? {
        let method = registry.access_method(frame.access_method)?;

        let kind = match RecordKind::resolve(method, frame.kind) {
            Some(kind) => kind,
            None => {
                write_unknown(out, json, frame.position, method.name(), frame.kind)?;
                continue;
            }
        };

        let record = record::decode(&frame.payload, kind).map_err(|source| CliError::Decode {
            position: frame.position,
            source,
        })?;

        if json {
            let line = serde_json::json!({
                "position": frame.position,
                "method": method.name(),
                "kind": describe::identify_kind(kind),
                "desc": describe::format(&record),
                "record": record,
            });
            writeln!(out, "{}", line)?;
        } else {
            writeln!(
                out,
                "pos {:>8}  {}/{}: {}",
                frame.position,
                method.name(),
                describe::identify_kind(kind),
                describe::format(&record)
            )?;
        }
    }

    if reader.ended_with_partial_frame() {
        writeln!(out, "(log ends on a torn frame; tail discarded)")?;
    }

    Ok(())
}

fn write_unknown(
    out: &mut impl Write,
    json: bool,
    position: u64,
    method: &str,
    kind_tag: u8,
) -> CliResult<()> {
    if json {
        let line = serde_json::json!({
            "position": position,
            "method": method,
            "kind": "unknown",
            "kind_tag": kind_tag,
        });
        writeln!(out, "{}", line)?;
    } else {
        writeln!(
            out,
            "pos {:>8}  {}/unknown (kind tag {})",
            position, method, kind_tag
        )?;
    }
    Ok(())
}
