//! `/automation` resource.

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::schema::{AutomationStatus, Execution, TriggerReceipt, TriggerRequest};

#[derive(Serialize)]
struct ExecutionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

pub struct AutomationApi<'a> {
    http: &'a ApiClient,
}

impl<'a> AutomationApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    pub async fn status(&self) -> ApiResult<AutomationStatus> {
        self.http.get(&["automation", "status"]).await?.into_data()
    }

    /// Run the posting pipeline for one page, or for every active page when
    /// `page_id` is `None` (body `{}`).
    pub async fn trigger(&self, page_id: Option<&str>) -> ApiResult<TriggerReceipt> {
        let body = TriggerRequest {
            page_id: page_id.map(str::to_string),
        };
        Ok(self
            .http
            .post::<TriggerReceipt, _>(&["automation", "trigger"], &body)
            .await?
            .data
            .unwrap_or_default())
    }

    pub async fn executions(&self, limit: Option<u32>) -> ApiResult<Vec<Execution>> {
        Ok(self
            .http
            .get_with_query::<Vec<Execution>, _>(
                &["automation", "executions"],
                &ExecutionsQuery { limit },
            )
            .await?
            .data
            .unwrap_or_default())
    }
}
