//! # Cloudlog
//!
//! A structured JSON log sink with size-bounded file rotation and
//! request-trace correlation.
//!
//! ## Features
//!
//! - One self-contained JSON line per log record, ready for a centralized
//!   log collector
//! - Size-capped active file with a bounded chain of backup generations
//! - Trace-id enrichment from a per-record override or the ambient
//!   trace-context header
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! use cloudlog::SinkConfig;
//!
//! let config = SinkConfig::new().with_directory("/var/log/app_engine");
//! cloudlog::init_logging(&config)?;
//!
//! tracing::info!("This is an info message");
//! # Ok::<(), cloudlog::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod layer;
pub mod record;
pub mod trace;
pub mod writer;

pub use builder::SinkBuilder;
pub use config::SinkConfig;
pub use error::{Error, Result};
pub use handler::CloudLogHandler;
pub use layer::{CloudLogLayer, flush, init_logging};
pub use record::{LogRecord, Timestamp};
pub use trace::{TRACE_CONTEXT_ENV, ambient_trace_context, resolve_trace_id};
pub use writer::RotatingSink;

/// Start a [`SinkBuilder`] with the reference defaults.
pub fn builder() -> SinkBuilder {
    SinkBuilder::new()
}
