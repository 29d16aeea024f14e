//! Event store boundary
//!
//! The engine never owns a connection: it asks an [`EventStore`] for the
//! snapshot of events matching a selector and works on that copy.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Event, Selector};

/// Source of events for a selector
///
/// Implementations must return every matching event. Order is not
/// significant and an empty result is not an error. Timestamps must already
/// be UTC-normalized.
pub trait EventStore: Send + Sync {
    fn fetch_events(&self, selector: &Selector) -> Result<Vec<Event>, StoreError>;
}

impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    fn fetch_events(&self, selector: &Selector) -> Result<Vec<Event>, StoreError> {
        (**self).fetch_events(selector)
    }
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn fetch_events(&self, selector: &Selector) -> Result<Vec<Event>, StoreError> {
        (**self).fetch_events(selector)
    }
}

/// Immutable in-memory snapshot of events
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    events: Vec<Event>,
}

impl InMemoryEventStore {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Load events from a JSON array or newline-delimited JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let events = parse_events(&content)?;
        info!(path = %path.display(), events = events.len(), "Loaded event snapshot");

        Ok(Self::new(events))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

impl EventStore for InMemoryEventStore {
    fn fetch_events(&self, selector: &Selector) -> Result<Vec<Event>, StoreError> {
        let tag = selector.tag();
        let matched: Vec<Event> = self
            .events
            .iter()
            .filter(|event| event.stream_tags.contains(&tag))
            .cloned()
            .collect();

        debug!(selector = %selector, matched = matched.len(), "Fetched events");
        Ok(matched)
    }
}

/// Parse a JSON array of events, or one event per line
///
/// Blank lines are skipped; parse errors report the 1-based line number.
pub fn parse_events(content: &str) -> Result<Vec<Event>, StoreError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|source| StoreError::Parse {
            line: source.line(),
            source,
        });
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| StoreError::Parse {
                line: index + 1,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn event(day: u32, selector: &Selector) -> Event {
        Event::new(Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap()).with_selector(selector)
    }

    #[test]
    fn test_fetch_filters_by_selector() {
        let alice = Selector::entity("alice");
        let pair = Selector::pair("alice", "bob");
        let store = InMemoryEventStore::new(vec![
            event(1, &alice),
            event(2, &pair),
            event(3, &alice),
        ]);

        assert_eq!(store.fetch_events(&alice).unwrap().len(), 2);
        assert_eq!(store.fetch_events(&Selector::pair("bob", "alice")).unwrap().len(), 1);
        assert!(store.fetch_events(&Selector::source("logs")).unwrap().is_empty());
    }

    #[test]
    fn test_load_json_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2020-01-01T00:00:00Z","stream_tags":["entity:alice"]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2020-01-09T00:00:00Z","stream_tags":["entity:alice"],"metadata":{{"event_type":"flight"}}}}"#
        )
        .unwrap();

        let store = InMemoryEventStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.events()[1].metadata["event_type"], "flight");
    }

    #[test]
    fn test_load_json_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"timestamp":"2020-01-01T00:00:00Z"}},{{"timestamp":"2020-01-02T00:00:00Z"}}]"#
        )
        .unwrap();

        let store = InMemoryEventStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let content = "{\"timestamp\":\"2020-01-01T00:00:00Z\"}\nnot json\n";
        match parse_events(content) {
            Err(StoreError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = InMemoryEventStore::from_json_file("/nonexistent/events.json");
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
