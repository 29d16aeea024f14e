//! Burst, gap and merged anomaly commands

use anomaly_lib::{
    Anomaly, AnomalyEngine, AnomalyParams, AnomalyReport, BurstParams, GapParams,
    InMemoryEventStore, Selector,
};
use anyhow::{Context, Result};
use chrono::SecondsFormat;

use crate::client::ApiClient;
use crate::output::{print_report, OutputFormat};

/// Where analytics are computed
pub enum Backend {
    /// In-process engine over an events file
    Local(AnomalyEngine<InMemoryEventStore>),
    /// Remote analytics server
    Remote(ApiClient),
}

impl Backend {
    pub fn local(events_path: &str) -> Result<Self> {
        let store = InMemoryEventStore::from_json_file(events_path)
            .with_context(|| format!("Failed to load events from {}", events_path))?;
        Ok(Backend::Local(AnomalyEngine::new(store)))
    }

    pub fn remote(api_url: &str) -> Result<Self> {
        Ok(Backend::Remote(ApiClient::new(api_url)?))
    }
}

/// One analytics request
#[derive(Debug, Clone, Copy)]
pub enum AnalyticsRequest {
    Bursts(BurstParams),
    Gaps(GapParams),
    Anomalies(AnomalyParams),
}

impl AnalyticsRequest {
    fn path(&self) -> &'static str {
        match self {
            AnalyticsRequest::Bursts(_) => "api/v1/analytics/bursts",
            AnalyticsRequest::Gaps(_) => "api/v1/analytics/gaps",
            AnalyticsRequest::Anomalies(_) => "api/v1/analytics/anomalies",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            AnalyticsRequest::Bursts(_) => "Activity Bursts",
            AnalyticsRequest::Gaps(_) => "Silence Gaps",
            AnalyticsRequest::Anomalies(_) => "Temporal Anomalies",
        }
    }

    /// Query string parameters for the server route
    pub fn query(&self, selector: &Selector) -> Vec<(&'static str, String)> {
        let mut query = vec![("selector", selector.to_string())];
        let (burst, gap) = match self {
            AnalyticsRequest::Bursts(burst) => (Some(burst), None),
            AnalyticsRequest::Gaps(gap) => (None, Some(gap)),
            AnalyticsRequest::Anomalies(params) => (Some(&params.burst), Some(&params.gap)),
        };

        if let Some(burst) = burst {
            query.push(("bucket_width_days", burst.bucket_width_days.to_string()));
            query.push(("z_threshold", burst.z_threshold.to_string()));
        }
        if let Some(gap) = gap {
            query.push(("threshold_days", gap.threshold_days.to_string()));
            if let Some(end) = gap.observation_end {
                query.push((
                    "observation_end",
                    end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ));
            }
        }
        query
    }
}

/// Compute a report with the given backend
pub async fn compute(
    backend: &Backend,
    selector: Selector,
    request: AnalyticsRequest,
) -> Result<AnomalyReport> {
    match backend {
        Backend::Remote(client) => client.get(request.path(), &request.query(&selector)).await,
        Backend::Local(engine) => {
            let anomalies: Vec<Anomaly> = match &request {
                AnalyticsRequest::Bursts(params) => engine
                    .compute_bursts(&selector, params)?
                    .into_iter()
                    .map(Anomaly::from)
                    .collect(),
                AnalyticsRequest::Gaps(params) => engine
                    .compute_gaps(&selector, params)?
                    .into_iter()
                    .map(Anomaly::from)
                    .collect(),
                AnalyticsRequest::Anomalies(params) => engine.compute_anomalies(&selector, params)?,
            };
            Ok(AnomalyReport::new(selector, &anomalies))
        }
    }
}

/// Compute and print a report
pub async fn run(
    backend: &Backend,
    selector: Selector,
    request: AnalyticsRequest,
    format: OutputFormat,
) -> Result<()> {
    let report = compute(backend, selector, request).await?;
    print_report(&report, request.title(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_gap_query_includes_observation_end() {
        let request = AnalyticsRequest::Gaps(GapParams {
            threshold_days: 30.0,
            observation_end: Some(Utc.with_ymd_and_hms(2020, 2, 10, 0, 0, 0).unwrap()),
        });
        let query = request.query(&Selector::pair("B", "A"));

        assert_eq!(
            query,
            vec![
                ("selector", "pair:A|B".to_string()),
                ("threshold_days", "30".to_string()),
                ("observation_end", "2020-02-10T00:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_observation_end_keeps_fractional_seconds() {
        let end = Utc.with_ymd_and_hms(2020, 2, 10, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let request = AnalyticsRequest::Gaps(GapParams {
            threshold_days: 30.0,
            observation_end: Some(end),
        });
        let query = request.query(&Selector::entity("a"));

        assert_eq!(query[2], ("observation_end", "2020-02-10T00:00:00.250Z".to_string()));
    }

    #[test]
    fn test_anomalies_query_carries_both_parameter_sets() {
        let request = AnalyticsRequest::Anomalies(AnomalyParams::default());
        let keys: Vec<&str> = request
            .query(&Selector::entity("a"))
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            vec!["selector", "bucket_width_days", "z_threshold", "threshold_days"]
        );
    }
}
