//! `/drive` resource.

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::schema::DriveFolder;

pub struct DriveApi<'a> {
    http: &'a ApiClient,
}

impl<'a> DriveApi<'a> {
    pub fn new(http: &'a ApiClient) -> Self {
        Self { http }
    }

    pub async fn folders(&self) -> ApiResult<Vec<DriveFolder>> {
        Ok(self
            .http
            .get::<Vec<DriveFolder>>(&["drive", "folders"])
            .await?
            .data
            .unwrap_or_default())
    }
}
