use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A single log record as handed to the sink.
///
/// The message is already rendered by the caller's logging framework; this
/// crate never re-renders format arguments.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Pre-rendered, human-readable message.
    pub message: String,
    /// Creation time as fractional seconds since the Unix epoch.
    pub created: f64,
    /// Integer id of the emitting thread.
    pub thread: u64,
    /// Severity name (e.g., "INFO", "ERROR").
    pub severity: String,
    /// Explicit per-record trace id, taking precedence over the ambient header.
    pub trace_id: Option<String>,
}

impl LogRecord {
    /// Create a record stamped with the current time and thread.
    pub fn new(severity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            created: unix_now(),
            thread: current_thread_id(),
            severity: severity.into(),
            trace_id: None,
        }
    }

    /// Attach an explicit trace id.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Encode this record as one line of JSON, with no trailing newline.
    ///
    /// `trace_id` is the resolved correlation id; when `None` the `traceId`
    /// key is omitted entirely. Encoding cannot fail on payload content: all
    /// fields are plain strings and integers, and JSON string escaping keeps
    /// line terminators out of the output.
    pub fn to_json_line(&self, trace_id: Option<&str>) -> String {
        let payload = Payload {
            message: &self.message,
            timestamp: Timestamp::from_created(self.created),
            thread: self.thread,
            severity: &self.severity,
            trace_id,
        };

        serde_json::to_string(&payload).unwrap_or_else(|_| {
            serde_json::json!({
                "message": self.message,
                "severity": self.severity,
            })
            .to_string()
        })
    }
}

/// Split-second timestamp, the shape the collector expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Fractional part in nanoseconds, always in `[0, 1e9)`.
    pub nanos: u32,
}

impl Timestamp {
    /// Split fractional epoch seconds into whole seconds and rounded nanos.
    pub fn from_created(created: f64) -> Self {
        let whole = created.floor();
        let mut seconds = whole as i64;
        let mut nanos = ((created - whole) * 1e9).round() as u64;
        // Rounding the fraction can land exactly on the next second.
        if nanos >= 1_000_000_000 {
            seconds += 1;
            nanos -= 1_000_000_000;
        }
        Self {
            seconds,
            nanos: nanos as u32,
        }
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    message: &'a str,
    timestamp: Timestamp,
    thread: u64,
    severity: &'a str,
    #[serde(rename = "traceId", skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
}

pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Small integer id for the current thread.
///
/// `std::thread::ThreadId` exposes no stable integer, so ids are assigned
/// from a process-wide counter on first use per thread.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(created: f64) -> LogRecord {
        LogRecord {
            message: "hello".to_string(),
            created,
            thread: 7,
            severity: "INFO".to_string(),
            trace_id: None,
        }
    }

    #[test]
    fn test_timestamp_split() {
        let ts = Timestamp::from_created(1.5);
        assert_eq!(ts.seconds, 1);
        assert_eq!(ts.nanos, 500_000_000);

        // .5 and .75 stay exact in an f64 even at epoch magnitude.
        let ts = Timestamp::from_created(1456300150.5);
        assert_eq!(ts.seconds, 1456300150);
        assert_eq!(ts.nanos, 500_000_000);

        let ts = Timestamp::from_created(1456300150.75);
        assert_eq!(ts.seconds, 1456300150);
        assert_eq!(ts.nanos, 750_000_000);

        let ts = Timestamp::from_created(42.0);
        assert_eq!(ts.seconds, 42);
        assert_eq!(ts.nanos, 0);
    }

    #[test]
    fn test_timestamp_rounding_carries_into_seconds() {
        let ts = Timestamp::from_created(9.999_999_999_9);
        assert_eq!(ts.seconds, 10);
        assert_eq!(ts.nanos, 0);
    }

    #[test]
    fn test_json_line_schema() {
        let line = record_at(3.25).to_json_line(None);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["message"], "hello");
        assert_eq!(value["timestamp"]["seconds"], 3);
        assert_eq!(value["timestamp"]["nanos"], 250_000_000);
        assert_eq!(value["thread"], 7);
        assert_eq!(value["severity"], "INFO");
        assert!(value.get("traceId").is_none());
    }

    #[test]
    fn test_json_line_with_trace_id() {
        let line = record_at(0.0).to_json_line(Some("abc123"));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["traceId"], "abc123");
    }

    #[test]
    fn test_json_line_never_embeds_newline() {
        let mut record = record_at(1.0);
        record.message = "line one\nline two\r\nend".to_string();
        let line = record.to_json_line(Some("id\nwith newline"));

        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
        // Still round-trips with the original content intact.
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "line one\nline two\r\nend");
    }

    #[test]
    fn test_key_order_is_stable() {
        let a = record_at(5.0).to_json_line(Some("t"));
        let b = record_at(5.0).to_json_line(Some("t"));
        assert_eq!(a, b);
        assert!(a.starts_with("{\"message\":"));
    }

    #[test]
    fn test_new_stamps_time_and_thread() {
        let record = LogRecord::new("WARNING", "careful");
        assert!(record.created > 0.0);
        assert_eq!(record.thread, current_thread_id());
        assert_eq!(record.severity, "WARNING");
        assert!(record.trace_id.is_none());
    }

    #[test]
    fn test_thread_ids_distinct_across_threads() {
        let here = current_thread_id();
        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }
}
