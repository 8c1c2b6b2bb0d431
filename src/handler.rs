use crate::{LogRecord, Result, RotatingSink, SinkConfig, resolve_trace_id};
use std::path::Path;

/// Composition of the record pipeline: trace resolution, JSON formatting,
/// rotated file output.
///
/// One handler is constructed at process start and passed by reference to
/// whatever dispatches records to it; it holds the only open handle on the
/// active log file and lives until shutdown.
#[derive(Debug)]
pub struct CloudLogHandler {
    sink: RotatingSink,
}

impl CloudLogHandler {
    /// Open the handler and its sink.
    pub fn open(config: &SinkConfig) -> Result<Self> {
        Ok(Self {
            sink: RotatingSink::open(config)?,
        })
    }

    /// Emit one record: resolve its trace id against `trace_header`, encode
    /// the payload, and append it to the rotating file.
    ///
    /// Sink failures propagate to the caller unretried.
    pub fn handle(&self, record: &LogRecord, trace_header: &str) -> Result<()> {
        let trace_id = resolve_trace_id(record.trace_id.as_deref(), trace_header);
        let line = record.to_json_line(trace_id.as_deref());
        self.sink.write_line(&line)
    }

    /// Sync the active file to disk.
    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        self.sink.path()
    }
}
