//! `/logs` resource.

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::schema::{LogEntry, LogLevel, LogSummary};

/// Query for `GET /logs`. Unset filters are left out of the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFilter {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            log_type: None,
            level: None,
            limit: Some(100),
        }
    }
}

pub struct LogsApi<'a> {
    http: &'a ApiClient,
}

impl<'a> LogsApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, filter: &LogFilter) -> ApiResult<Vec<LogEntry>> {
        Ok(self
            .http
            .get_with_query::<Vec<LogEntry>, _>(&["logs"], filter)
            .await?
            .data
            .unwrap_or_default())
    }

    pub async fn summary(&self) -> ApiResult<LogSummary> {
        self.http.get(&["logs", "summary"]).await?.into_data()
    }
}
