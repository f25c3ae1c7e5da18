use tracing::Span;

use super::TraceId;

/// Root span for one sampling tick of the monitor loop.
pub fn tick_span(trace_id: &TraceId, epoch: u64) -> Span {
    tracing::info_span!(
        "tick",
        trace_id = %trace_id,
        epoch,
        price = tracing::field::Empty
    )
}

/// Create a child span (inherits trace_id from the current span)
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name)
}
