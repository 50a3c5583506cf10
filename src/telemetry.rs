use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// An upstream payload that did not match the shape we depend on.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaViolation {
    pub upstream: &'static str,
    pub reason: String,
    pub payload: Value,
    pub context: Value,
}

/// Out-of-band monitoring signals. Implementations must not fail or block.
pub trait Telemetry: Send + Sync {
    fn schema_violation(&self, violation: SchemaViolation);

    fn rate_limited(&self, message: &str, context: Value);
}

/// Emits telemetry as structured `tracing` events.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn schema_violation(&self, violation: SchemaViolation) {
        tracing::error!(
            event_id = %Uuid::new_v4(),
            upstream = violation.upstream,
            reason = %violation.reason,
            context = %violation.context,
            payload = %violation.payload,
            "upstream payload failed validation"
        );
    }

    fn rate_limited(&self, message: &str, context: Value) {
        tracing::warn!(
            event_id = %Uuid::new_v4(),
            context = %context,
            "{}",
            message
        );
    }
}
