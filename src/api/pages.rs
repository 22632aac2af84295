//! `/pages` resource.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::page_form::PageInput;
use crate::schema::{BulkResult, Page};

pub struct PagesApi<'a> {
    http: &'a ApiClient,
}

impl<'a> PagesApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> ApiResult<Vec<Page>> {
        Ok(self
            .http
            .get::<Vec<Page>>(&["pages"])
            .await?
            .data
            .unwrap_or_default())
    }

    pub async fn get(&self, page_id: &str) -> ApiResult<Page> {
        self.http.get(&["pages", page_id]).await?.into_data()
    }

    pub async fn create(&self, input: &PageInput) -> ApiResult<Page> {
        self.http.post(&["pages"], input).await?.into_data()
    }

    pub async fn update(&self, page_id: &str, input: &PageInput) -> ApiResult<Page> {
        self.http.put(&["pages", page_id], input).await?.into_data()
    }

    /// Returns the server's confirmation message, if any.
    pub async fn delete(&self, page_id: &str) -> ApiResult<Option<String>> {
        Ok(self.http.delete::<Value>(&["pages", page_id]).await?.message)
    }

    pub async fn reset_consumed_rows(&self, page_id: &str) -> ApiResult<Option<String>> {
        Ok(self
            .http
            .post_empty::<Value>(&["pages", page_id, "reset-consumed-rows"])
            .await?
            .message)
    }

    pub async fn bulk_enable_schedules(&self) -> ApiResult<BulkResult> {
        self.bulk("bulk-enable-schedules").await
    }

    pub async fn bulk_disable_schedules(&self) -> ApiResult<BulkResult> {
        self.bulk("bulk-disable-schedules").await
    }

    pub async fn bulk_clear_timings(&self) -> ApiResult<BulkResult> {
        self.bulk("bulk-clear-timings").await
    }

    pub async fn bulk_reset_consumed_rows(&self) -> ApiResult<BulkResult> {
        self.bulk("bulk-reset-consumed-rows").await
    }

    async fn bulk(&self, action: &str) -> ApiResult<BulkResult> {
        Ok(self
            .http
            .post_empty::<BulkResult>(&["pages", action])
            .await?
            .data
            .unwrap_or_default())
    }
}
