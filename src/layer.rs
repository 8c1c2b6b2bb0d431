//! `tracing` integration.
//!
//! [`CloudLogLayer`] turns each event into a [`LogRecord`] and hands it to a
//! [`CloudLogHandler`] synchronously; there is no background worker between
//! the event and the file. [`init_logging`] wires the layer into the global
//! subscriber behind an [`EnvFilter`] built from the configured level.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::record::current_thread_id;
use crate::trace::ambient_trace_context;
use crate::{CloudLogHandler, Error, LogRecord, Result, SinkConfig};

/// Handler installed by [`init_logging`], kept so [`flush`] can reach it at
/// shutdown.
static ACTIVE_HANDLER: Lazy<Mutex<Option<Arc<CloudLogHandler>>>> =
    Lazy::new(|| Mutex::new(None));

/// `tracing_subscriber` layer that forwards events to a [`CloudLogHandler`].
///
/// The ambient trace-context value is obtained from an injectable source so
/// tests never have to mutate the process environment; the default source
/// reads the correlation header variable on every event.
pub struct CloudLogLayer {
    handler: Arc<CloudLogHandler>,
    ambient: Box<dyn Fn() -> String + Send + Sync>,
}

impl CloudLogLayer {
    /// Create a layer reading the ambient trace context from the environment.
    pub fn new(handler: Arc<CloudLogHandler>) -> Self {
        Self {
            handler,
            ambient: Box::new(ambient_trace_context),
        }
    }

    /// Replace the ambient trace-context source.
    pub fn with_ambient_source(
        mut self,
        source: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.ambient = Box::new(source);
        self
    }
}

impl<S: Subscriber> Layer<S> for CloudLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message.unwrap_or_default();
        if !visitor.extra.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(&visitor.extra);
        }

        let record = LogRecord {
            message,
            created: crate::record::unix_now(),
            thread: current_thread_id(),
            severity: event.metadata().level().to_string(),
            trace_id: visitor.trace_id,
        };

        // Dispatch through `tracing` is infallible; the fallible surface is
        // the handler API.
        if let Err(e) = self.handler.handle(&record, &(self.ambient)()) {
            eprintln!("cloudlog: failed to write log record: {}", e);
        }
    }
}

/// Collects event fields: the rendered message, an explicit `trace_id`
/// override, and everything else coerced to `key=value` text.
#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    trace_id: Option<String>,
    extra: String,
}

impl FieldVisitor {
    fn push_extra(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.extra.is_empty() {
            self.extra.push(' ');
        }
        self.extra.push_str(name);
        self.extra.push('=');
        self.extra.push_str(&value.to_string());
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "trace_id" => self.trace_id = Some(value.to_string()),
            name => self.push_extra(name, value),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_extra(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_extra(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_extra(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push_extra(field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            "trace_id" => self.trace_id = Some(format!("{:?}", value)),
            name => self.push_extra(name, format_args!("{:?}", value)),
        }
    }
}

/// Install the sink as the global `tracing` subscriber.
///
/// Builds the handler from `config`, composes registry + filter + layer, and
/// retains the handler so [`flush`] can sync the file at shutdown.
pub fn init_logging(config: &SinkConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(effective_log_spec(config)).map_err(|e| Error::Init(e.to_string()))?;

    let handler = Arc::new(CloudLogHandler::open(config)?);
    let layer = CloudLogLayer::new(Arc::clone(&handler));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    *ACTIVE_HANDLER.lock().unwrap() = Some(handler);
    Ok(())
}

/// Sync the active log file of the handler installed by [`init_logging`].
///
/// A no-op when logging was never initialized.
pub fn flush() -> Result<()> {
    if let Some(handler) = ACTIVE_HANDLER.lock().unwrap().as_ref() {
        handler.flush()?;
    }
    Ok(())
}

/// Determine the effective filter directive. `RUST_LOG` takes precedence
/// over the configured level.
fn effective_log_spec(config: &SinkConfig) -> String {
    if let Ok(spec) = std::env::var("RUST_LOG")
        && !spec.is_empty()
    {
        return spec;
    }

    if config.level.is_empty() {
        "info".to_string()
    } else {
        config.level.clone()
    }
}
