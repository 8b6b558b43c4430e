//! Google Sheets adapter.
//!
//! Reads a value range and returns it as tabular data. Provider row order is
//! preserved exactly; cells stay untouched scalars until normalization.

use crate::config::SourceSettings;
use crate::sources::types::{
    optional_str, require_str, DocumentPayload, FetchParams, SourceError, SourceId,
};
use crate::sources::SourceAdapter;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Range applied when the request does not name one.
const DEFAULT_RANGE: &str = "A1:Z1000";

/// Adapter fetching tabular data through the Google Sheets values API.
pub struct GsheetAdapter {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GsheetAdapter {
    /// Construct an adapter from its connection settings.
    pub fn new(settings: &SourceSettings) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent("docbridge/0.1")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Gsheet,
                cause,
            })?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[async_trait]
impl SourceAdapter for GsheetAdapter {
    fn id(&self) -> SourceId {
        SourceId::Gsheet
    }

    async fn fetch(&self, params: &FetchParams) -> Result<DocumentPayload, SourceError> {
        let spreadsheet_id = require_str(params, "spreadsheet_id")?;
        let range = optional_str(params, "range").unwrap_or(DEFAULT_RANGE);
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}",
            self.base_url
        );

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|cause| SourceError::Transport {
                source_id: SourceId::Gsheet,
                cause,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = SourceError::UnexpectedStatus {
                source_id: SourceId::Gsheet,
                status,
                body,
            };
            tracing::error!(spreadsheet_id, range, error = %error, "Google Sheets fetch failed");
            return Err(error);
        }

        let payload: ValueRange =
            response
                .json()
                .await
                .map_err(|cause| SourceError::Transport {
                    source_id: SourceId::Gsheet,
                    cause,
                })?;

        tracing::debug!(
            spreadsheet_id,
            range,
            rows = payload.values.len(),
            "Fetched Google Sheet range"
        );
        Ok(DocumentPayload::Table(payload.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn adapter_for(server: &MockServer) -> GsheetAdapter {
        GsheetAdapter::new(&SourceSettings {
            base_url: server.base_url(),
            api_key: "google-token".into(),
            timeout_secs: 5,
        })
        .expect("adapter")
    }

    fn params_with_sheet(spreadsheet_id: &str) -> FetchParams {
        let mut params = FetchParams::new();
        params.insert("spreadsheet_id".into(), json!(spreadsheet_id));
        params
    }

    #[tokio::test]
    async fn fetch_returns_rows_in_provider_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v4/spreadsheets/sheet-1/values/B2:C3")
                    .header("authorization", "Bearer google-token");
                then.status(200).json_body(json!({
                    "range": "B2:C3",
                    "values": [["name", "count"], ["widgets", 42]]
                }));
            })
            .await;

        let adapter = adapter_for(&server);
        let mut params = params_with_sheet("sheet-1");
        params.insert("range".into(), json!("B2:C3"));
        let payload = adapter.fetch(&params).await.expect("payload");

        mock.assert();
        assert_eq!(
            payload,
            DocumentPayload::Table(vec![
                vec![json!("name"), json!("count")],
                vec![json!("widgets"), json!(42)],
            ])
        );
    }

    #[tokio::test]
    async fn fetch_applies_default_range() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/v4/spreadsheets/sheet-2/values/{DEFAULT_RANGE}"));
                then.status(200).json_body(json!({ "values": [] }));
            })
            .await;

        let adapter = adapter_for(&server);
        let payload = adapter
            .fetch(&params_with_sheet("sheet-2"))
            .await
            .expect("payload");

        mock.assert();
        assert_eq!(payload, DocumentPayload::Table(Vec::new()));
    }

    #[tokio::test]
    async fn fetch_requires_spreadsheet_id() {
        let server = MockServer::start_async().await;
        let adapter = adapter_for(&server);

        let error = adapter
            .fetch(&FetchParams::new())
            .await
            .expect_err("missing parameter");
        assert!(matches!(
            error,
            SourceError::MissingParameter("spreadsheet_id")
        ));
    }
}
