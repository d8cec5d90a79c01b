/*!
 * Monitoring
 * Structured tracing for access-layer operations
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, OperationSpan};
