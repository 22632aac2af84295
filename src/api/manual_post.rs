//! `/manual-post` resource.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::schema::ManualPost;

pub struct ManualPostApi<'a> {
    http: &'a ApiClient,
}

impl<'a> ManualPostApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    /// Returns the server's confirmation message, if any.
    pub async fn create(&self, post: &ManualPost) -> ApiResult<Option<String>> {
        Ok(self.http.post::<Value, _>(&["manual-post"], post).await?.message)
    }
}
