//! Manual comparison post for one page: two names, two image URLs.

use std::sync::Arc;

use reqwest::Url;
use tracing::info;

use super::Outcome;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::interact::Interaction;
use crate::schema::ManualPost;

pub const CREATED: &str = "Manual post created! It will appear on Facebook shortly.";

pub struct ManualPostModal {
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    pub post: ManualPost,
    pub loading: bool,
    pub visible: bool,
}

impl ManualPostModal {
    pub fn open(client: ApiClient, ui: Arc<dyn Interaction>, page_id: &str) -> Self {
        Self {
            client,
            ui,
            post: ManualPost {
                page_id: page_id.to_string(),
                ..Default::default()
            },
            loading: false,
            visible: true,
        }
    }

    pub fn set_side_a(&mut self, name: &str, url: &str) {
        self.post.celebrity_a = name.trim().to_string();
        self.post.url_a = url.trim().to_string();
    }

    pub fn set_side_b(&mut self, name: &str, url: &str) {
        self.post.celebrity_b = name.trim().to_string();
        self.post.url_b = url.trim().to_string();
    }

    /// Every field is required and both URLs must be absolute.
    pub fn validate(&self) -> ApiResult<()> {
        let fields = [
            ("Page ID", &self.post.page_id),
            ("Celebrity A name", &self.post.celebrity_a),
            ("Image URL for A", &self.post.url_a),
            ("Celebrity B name", &self.post.celebrity_b),
            ("Image URL for B", &self.post.url_b),
        ];
        if let Some((label, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ApiError::validation(format!("{} is required", label)));
        }

        for (label, url) in [("A", &self.post.url_a), ("B", &self.post.url_b)] {
            Url::parse(url).map_err(|e| {
                ApiError::validation(format!("Image URL for {} is not a valid URL: {}", label, e))
            })?;
        }
        Ok(())
    }

    /// Post once. Closes on success, stays open with input kept on failure.
    pub async fn submit(&mut self) -> Outcome {
        if self.loading || !self.visible {
            return Outcome::Blocked;
        }

        self.loading = true;
        let result = match self.validate() {
            Ok(()) => self.client.manual_posts().create(&self.post).await,
            Err(e) => Err(e),
        };
        self.loading = false;

        match result {
            Ok(_) => {
                info!("Manual post created for page {}", self.post.page_id);
                self.ui.alert(CREATED);
                self.post = ManualPost {
                    page_id: self.post.page_id.clone(),
                    ..Default::default()
                };
                self.visible = false;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error creating post: {}", e));
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::testing::Scripted;
    use crate::page_form::{FormMode, PageForm};
    use crate::schema::ExecutionTrigger;
    use crate::server::testing::spawn;

    #[tokio::test]
    async fn test_submit_posts_once_and_closes() {
        let server = spawn().await;
        let form = PageForm {
            page_id: "123".to_string(),
            access_token: "tok".to_string(),
            ..Default::default()
        };
        server
            .client
            .pages()
            .create(&form.to_input(FormMode::Create).unwrap())
            .await
            .unwrap();

        let ui = Arc::new(Scripted::default());
        let mut modal = ManualPostModal::open(server.client.clone(), ui.clone(), "123");
        modal.set_side_a("Virat Kohli", "https://img.example/a.jpg");
        modal.set_side_b("MS Dhoni", "https://img.example/b.jpg");

        assert_eq!(modal.submit().await, Outcome::Completed);
        assert_eq!(ui.last_alert().as_deref(), Some(CREATED));
        assert!(!modal.visible);
        assert!(!modal.loading);
        assert_eq!(modal.post.page_id, "123");
        assert!(modal.post.celebrity_a.is_empty());

        let executions = server.store.executions(None);
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].trigger, ExecutionTrigger::ManualPost);

        assert_eq!(modal.submit().await, Outcome::Blocked);
        assert_eq!(server.store.executions(None).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_sends_nothing() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::default());
        let mut modal = ManualPostModal::open(server.client.clone(), ui.clone(), "123");

        modal.set_side_a("Virat Kohli", "https://img.example/a.jpg");
        assert_eq!(modal.submit().await, Outcome::Failed);
        assert_eq!(
            ui.last_alert().as_deref(),
            Some("Error creating post: Celebrity B name is required")
        );

        modal.set_side_b("MS Dhoni", "not a url");
        assert_eq!(modal.submit().await, Outcome::Failed);
        assert!(ui
            .last_alert()
            .is_some_and(|a| a.starts_with("Error creating post: Image URL for B is not a valid URL")));

        assert!(modal.visible);
        assert_eq!(modal.post.celebrity_a, "Virat Kohli");
        assert!(server.store.executions(None).is_empty());
        assert_eq!(server.store.log_summary().total_logs, 0);
    }

    #[tokio::test]
    async fn test_server_error_keeps_modal_open() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::default());
        let mut modal = ManualPostModal::open(server.client.clone(), ui.clone(), "missing");
        modal.set_side_a("A", "https://img.example/a.jpg");
        modal.set_side_b("B", "https://img.example/b.jpg");

        assert_eq!(modal.submit().await, Outcome::Failed);
        assert_eq!(
            ui.last_alert().as_deref(),
            Some("Error creating post: Page not found: missing")
        );
        assert!(modal.visible);
        assert!(!modal.loading);
    }
}
