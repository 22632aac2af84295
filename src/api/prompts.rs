//! `/prompts` resource.

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::prompt_form::PromptDraft;
use crate::schema::Prompt;

pub struct PromptsApi<'a> {
    http: &'a ApiClient,
}

impl<'a> PromptsApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> ApiResult<Vec<Prompt>> {
        Ok(self
            .http
            .get::<Vec<Prompt>>(&["prompts"])
            .await?
            .data
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> ApiResult<Prompt> {
        self.http.get(&["prompts", id]).await?.into_data()
    }

    pub async fn create(&self, draft: &PromptDraft) -> ApiResult<Prompt> {
        self.http.post(&["prompts"], draft).await?.into_data()
    }

    pub async fn update(&self, id: &str, draft: &PromptDraft) -> ApiResult<Prompt> {
        self.http.put(&["prompts", id], draft).await?.into_data()
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Option<String>> {
        Ok(self.http.delete::<Value>(&["prompts", id]).await?.message)
    }
}
