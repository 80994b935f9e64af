use chrono::{DateTime, Utc};

/// Something that happened to a storefront aggregate.
///
/// Event types are dotted, lower-case names scoped by aggregate
/// (`basket.line_added`, `basket.submitted`). An event is never edited once
/// emitted; a changed payload gets a new `version`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    /// Payload schema version, starting at 1.
    fn version(&self) -> u32;

    /// Business time of the change, as stamped by the command that caused it.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// The aggregate kind, i.e. the first segment of the event type.
    fn aggregate_type(&self) -> &'static str {
        let event_type = self.event_type();
        event_type.split('.').next().unwrap_or(event_type)
    }
}
