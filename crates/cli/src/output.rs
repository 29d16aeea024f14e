//! Output formatting utilities

use anomaly_lib::{AnomalyKind, AnomalyRecord, AnomalyReport};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the anomalies table
#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Count")]
    count: String,
    #[tabled(rename = "Days")]
    duration_days: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
    #[tabled(rename = "Z")]
    z_score: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
}

impl From<&AnomalyRecord> for AnomalyRow {
    fn from(record: &AnomalyRecord) -> Self {
        Self {
            kind: color_kind(record.kind),
            start: format_timestamp(&record.start),
            end: format_timestamp(&record.end),
            count: format_optional(record.count.map(|c| c.to_string())),
            duration_days: format_optional(record.duration_days.map(|d| format!("{:.1}", d))),
            mean: format_optional(record.mean.map(|m| format!("{:.2}", m))),
            std: format_optional(record.std.map(|s| format!("{:.2}", s))),
            z_score: format_optional(record.z_score.map(|z| format!("{:.2}", z))),
            threshold: format!("{:.2}", record.threshold),
        }
    }
}

/// Print an anomaly report in the requested format
pub fn print_report(report: &AnomalyReport, title: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            println!("{}", title.bold());
            println!("{}", "=".repeat(60));
            println!("Selector: {}", report.selector.to_string().cyan());
            println!();

            if report.anomalies.is_empty() {
                print_info("No anomalies found for this stream");
                return Ok(());
            }

            let rows: Vec<AnomalyRow> = report.anomalies.iter().map(AnomalyRow::from).collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
            println!("\nTotal: {} anomalies", report.total);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color an anomaly kind
pub fn color_kind(kind: AnomalyKind) -> String {
    match kind {
        AnomalyKind::Burst => kind.to_string().red().bold().to_string(),
        AnomalyKind::Gap => kind.to_string().yellow().to_string(),
    }
}

/// Format a timestamp for table display
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn format_optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}
