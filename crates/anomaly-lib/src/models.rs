//! Core data models for the anomaly engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::SelectorParseError;

/// Separator between the two names of a pair key
pub const PAIR_SEPARATOR: char = '|';

/// Kind of logical stream a selector addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// A single extracted entity
    Entity,
    /// Two entities observed together
    Pair,
    /// A document source (e.g. a flight log)
    Source,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Entity => "entity",
            SelectorKind::Pair => "pair",
            SelectorKind::Source => "source",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorKind {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entity" => Ok(SelectorKind::Entity),
            "pair" => Ok(SelectorKind::Pair),
            "source" => Ok(SelectorKind::Source),
            other => Err(SelectorParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Predicate identifying one logical event stream
///
/// Pure data: matching is done against the `"<kind>:<key>"` tag carried by
/// each event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub kind: SelectorKind,
    pub key: String,
}

impl Selector {
    pub fn entity(key: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Entity,
            key: key.into(),
        }
    }

    /// Pair selector with an order-independent key
    pub fn pair(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            kind: SelectorKind::Pair,
            key: format!("{}{}{}", first, PAIR_SEPARATOR, second),
        }
    }

    pub fn source(key: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Source,
            key: key.into(),
        }
    }

    /// Stream tag an event must carry to match this selector
    pub fn tag(&self) -> String {
        format!("{}:{}", self.kind, self.key)
    }

    /// Check whether an event belongs to this selector's stream
    pub fn matches(&self, event: &Event) -> bool {
        event.stream_tags.contains(&self.tag())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, key) = s
            .split_once(':')
            .ok_or_else(|| SelectorParseError::MissingSeparator(s.to_string()))?;
        let kind: SelectorKind = kind.parse()?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorParseError::EmptyKey);
        }

        match kind {
            SelectorKind::Pair => {
                let (a, b) = key
                    .split_once(PAIR_SEPARATOR)
                    .ok_or_else(|| SelectorParseError::MalformedPair(key.to_string()))?;
                let (a, b) = (a.trim(), b.trim());
                if a.is_empty() || b.is_empty() {
                    return Err(SelectorParseError::MalformedPair(key.to_string()));
                }
                Ok(Selector::pair(a, b))
            }
            SelectorKind::Entity => Ok(Selector::entity(key)),
            SelectorKind::Source => Ok(Selector::source(key)),
        }
    }
}

/// A timestamped event extracted from the document corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub stream_tags: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            stream_tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Tag the event as part of the selector's stream
    pub fn with_selector(mut self, selector: &Selector) -> Self {
        self.stream_tags.insert(selector.tag());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Fixed-width time window with the number of events falling inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub count: u64,
}

/// Span between two consecutive events, or from the last event to an
/// observation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: Duration,
}

impl Interval {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration: end - start,
        }
    }
}
