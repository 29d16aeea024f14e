//! Demo event data
//!
//! A small communication stream between entities `A` and `B`: a weekly
//! baseline followed by a burst week.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use crate::models::{Event, Selector};

/// Selector for the demo stream
pub fn demo_selector() -> Selector {
    Selector::pair("A", "B")
}

/// Default start of the demo stream
pub fn demo_base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Four weekly baseline emails from `base`, then five daily emails from
/// `base + 28d`
pub fn seed_test_events(base: DateTime<Utc>) -> Vec<Event> {
    let selector = demo_selector();
    let email = |time: DateTime<Utc>, description: &str| {
        Event::new(time)
            .with_selector(&selector)
            .with_selector(&Selector::entity("A"))
            .with_selector(&Selector::entity("B"))
            .with_metadata("event_type", json!("email"))
            .with_metadata("description", json!(description))
            .with_metadata("pair", json!("A-B"))
    };

    let baseline = (0..4).map(|week| email(base + Duration::days(7 * week), "A <-> B baseline"));
    let burst_start = base + Duration::days(28);
    let burst = (0..5).map(|day| email(burst_start + Duration::days(day), "A <-> B burst"));

    baseline.chain(burst).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_shape() {
        let events = seed_test_events(demo_base());
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(|e| demo_selector().matches(e)));
        assert_eq!(events[4].timestamp - events[0].timestamp, Duration::days(28));
        assert_eq!(events[8].metadata["event_type"], "email");
    }
}
