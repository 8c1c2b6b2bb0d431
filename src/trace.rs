//! Trace-id resolution.
//!
//! A log line is correlated with its originating request either through an
//! explicit `trace_id` carried on the record, or through the trace-context
//! header value the serving stack exposes in the process environment. The
//! header is formatted `"<hex-trace-id>[/<options>]"`; only the id portion
//! matters here.

/// Environment variable carrying the ambient trace-context header.
pub const TRACE_CONTEXT_ENV: &str = "HTTP_X_CLOUD_TRACE_CONTEXT";

/// Read the ambient trace-context header value, empty when unset.
///
/// Kept separate from [`resolve_trace_id`] so resolution stays testable
/// without mutating the process environment.
pub fn ambient_trace_context() -> String {
    std::env::var(TRACE_CONTEXT_ENV).unwrap_or_default()
}

/// Resolve the trace id for a record.
///
/// A non-empty explicit id always wins and is returned unchanged. Otherwise
/// the header value is split on the first `/` and the leading portion is used
/// if non-empty. Absence is not an error; enrichment is best effort.
pub fn resolve_trace_id(explicit: Option<&str>, header: &str) -> Option<String> {
    if let Some(id) = explicit
        && !id.is_empty()
    {
        return Some(id.to_string());
    }

    match header.split('/').next() {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => None,
    }
}
