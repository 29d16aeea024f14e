//! API client for communicating with the analytics server

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// API client for the True Anomaly server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_lib::{AnomalyReport, Selector};
    use mockito::Matcher;

    #[tokio::test]
    async fn test_get_sends_query_and_parses_report() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/analytics/gaps")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("selector".into(), "entity:alice".into()),
                Matcher::UrlEncoded("threshold_days".into(), "30".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"selector":{"kind":"entity","key":"alice"},"anomalies":[
                    {"kind":"gap","start":"2020-01-01T00:00:00Z","end":"2020-02-15T00:00:00Z",
                     "duration_days":45.0,"threshold":30.0}],"total":1}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let report: AnomalyReport = client
            .get(
                "api/v1/analytics/gaps",
                &[
                    ("selector", "entity:alice".to_string()),
                    ("threshold_days", "30".to_string()),
                ],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(report.selector, Selector::entity("alice"));
        assert_eq!(report.anomalies[0].duration_days, Some(45.0));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/analytics/bursts")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"Invalid parameter 'z_threshold': must be positive","code":"invalid_parameter"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let result: Result<AnomalyReport> = client
            .get("api/v1/analytics/bursts", &[("selector", "entity:a".to_string())])
            .await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("400"));
        assert!(message.contains("invalid_parameter"));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
