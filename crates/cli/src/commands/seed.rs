//! Demo data export

use anomaly_lib::fixtures::{demo_base, demo_selector, seed_test_events};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::output::{print_info, print_success};

/// Render the demo events as newline-delimited JSON
pub fn render_seed(base: Option<DateTime<Utc>>) -> Result<String> {
    let events = seed_test_events(base.unwrap_or_else(demo_base));
    let lines = events
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to serialize events")?;
    Ok(lines.join("\n") + "\n")
}

/// Write the demo events to a file, or stdout when no file is given
pub fn seed(base: Option<DateTime<Utc>>, output: Option<String>) -> Result<()> {
    let content = render_seed(base)?;

    match output {
        Some(path) => {
            std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path))?;
            print_success(&format!("Wrote demo events to {}", path));
            print_info(&format!("Try: ta --events {} bursts --selector '{}'", path, demo_selector()));
        }
        None => print!("{}", content),
    }

    Ok(())
}
