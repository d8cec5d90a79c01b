/*!
 * Structured Tracing
 * Operation spans for the access layer using the tracing crate
 *
 * Every public operation opens an `OperationSpan`: a debug record on entry and
 * exit, an error record carrying path and reason on failure. Fields holding
 * raw paths or attribute contents are accompanied by `sensitive = true` so the
 * subscriber can redact them; nothing is redacted here.
 */

use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::core::errors::{FsAccessError, FsAccessResult};

/// Operations slower than this are reported at warn level
const SLOW_OPERATION_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SANDBOX_FS_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SANDBOX_FS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!(json = use_json, "structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span for one public access-layer operation
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
    operation: &'static str,
    path: Option<String>,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        Self::build(operation, None)
    }

    /// Span tagged with the (sensitive) path the operation targets
    pub fn with_path(operation: &'static str, path: &Path) -> Self {
        Self::build(operation, Some(path.display().to_string()))
    }

    fn build(operation: &'static str, path: Option<String>) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "operation",
            trace_id = %trace_id,
            operation = operation,
            path = tracing::field::Empty,
            sensitive = tracing::field::Empty,
            duration_us = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            result = tracing::field::Empty,
            error_kind = tracing::field::Empty,
            bytes = tracing::field::Empty,
            to = tracing::field::Empty,
            name = tracing::field::Empty,
            kind = tracing::field::Empty,
            stale = tracing::field::Empty,
        );
        if let Some(ref p) = path {
            span.record("path", p.as_str());
            span.record("sensitive", true);
        }

        let _entered = span.enter();
        debug!(operation = operation, trace_id = %trace_id, "operation started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            trace_id,
            operation,
            path,
        }
    }

    /// Get the trace ID for this operation
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record a field with any Debug-compatible type
    ///
    /// Only fields declared in `build` are kept: `bytes`, `to`, `name`, `kind`
    /// and `stale`. Unknown keys are dropped by `tracing`.
    pub fn record_debug<V: std::fmt::Debug>(&self, key: &str, value: V) {
        self.span.record(key, format!("{:?}", value).as_str());
    }

    /// Log a failure at error level with path and reason
    pub fn record_error(&self, err: &FsAccessError) {
        self.span.record("result", "error");
        self.span.record("error_kind", err.kind());
        let _entered = self.span.enter();
        error!(
            trace_id = %self.trace_id,
            operation = self.operation,
            path = self.path.as_deref().unwrap_or(""),
            sensitive = self.path.is_some(),
            kind = err.kind(),
            reason = err.reason(),
            "operation failed"
        );
    }

    /// Record the outcome of an operation and pass it through
    pub fn complete<T>(&self, result: FsAccessResult<T>) -> FsAccessResult<T> {
        match &result {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(err) => self.record_error(err),
        }
        result
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_OPERATION_MS {
            self.span.record("duration_ms", duration.as_millis() as u64);
            warn!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        } else {
            self.span.record("duration_us", duration.as_micros() as u64);
            debug!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_us = duration.as_micros() as u64,
                "operation completed"
            );
        }
    }
}
