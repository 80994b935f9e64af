//! Append-only, in-memory record of emitted events.

use chrono::{DateTime, Utc};

use crate::event::Event;

/// Events in the order they were recorded, each with its position.
#[derive(Debug, Clone)]
pub struct EventLog<E: Event> {
    entries: Vec<E>,
}

impl<E: Event> Default for EventLog<E> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<E: Event> EventLog<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events, returning the position of the first one.
    pub fn record(&mut self, events: impl IntoIterator<Item = E>) -> usize {
        let start = self.entries.len();
        for event in events {
            tracing::trace!(event_type = event.event_type(), position = self.entries.len(), "event recorded");
            self.entries.push(event);
        }
        start
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a E> + 'a {
        self.entries.iter().filter(move |e| e.event_type() == event_type)
    }

    /// Events that occurred at or after `since`.
    pub fn since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &E> {
        self.entries.iter().filter(move |e| e.occurred_at() >= since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Debug, Clone)]
    struct Noted {
        kind: &'static str,
        at: DateTime<Utc>,
    }

    impl Event for Noted {
        fn event_type(&self) -> &'static str {
            self.kind
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn events_keep_their_order_and_positions() {
        let now = Utc::now();
        let mut log = EventLog::new();
        assert_eq!(log.record([Noted { kind: "basket.created", at: now }]), 0);
        let position = log.record([
            Noted { kind: "basket.line_added", at: now },
            Noted { kind: "basket.submitted", at: now + Duration::seconds(5) },
        ]);
        assert_eq!(position, 1);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().map(Event::event_type), Some("basket.submitted"));
        assert_eq!(log.of_type("basket.line_added").count(), 1);
        assert_eq!(log.since(now + Duration::seconds(1)).count(), 1);
        assert!(log.iter().all(|e| e.aggregate_type() == "basket"));
    }

    #[test]
    fn undotted_types_are_their_own_aggregate() {
        let event = Noted { kind: "reindex", at: Utc::now() };
        assert_eq!(event.aggregate_type(), "reindex");
    }
}
