//! Prompts: CRUD over content-generation templates.

use std::sync::Arc;

use tracing::info;

use super::{truncate, Outcome, Table};
use crate::client::ApiClient;
use crate::interact::Interaction;
use crate::prompt_form::PromptForm;
use crate::schema::{Prompt, PromptType};

const PROMPT_TEXT_PREVIEW: usize = 60;

pub struct PromptsView {
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    pub prompts: Vec<Prompt>,
}

impl PromptsView {
    pub fn new(client: ApiClient, ui: Arc<dyn Interaction>) -> Self {
        Self {
            client,
            ui,
            prompts: Vec::new(),
        }
    }

    pub async fn load(&mut self) -> Outcome {
        match self.client.prompts().list().await {
            Ok(prompts) => {
                self.prompts = prompts;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error loading prompts: {}", e));
                self.prompts.clear();
                Outcome::Failed
            }
        }
    }

    pub fn prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn edit_form(&self, id: &str) -> Option<PromptForm> {
        self.prompt(id).map(PromptForm::from_prompt)
    }

    /// Create when `id` is `None`, otherwise update. Reloads on success.
    pub async fn save(&mut self, form: &PromptForm, id: Option<&str>) -> Outcome {
        let result = match form.to_draft() {
            Ok(draft) => match id {
                Some(id) => self.client.prompts().update(id, &draft).await,
                None => self.client.prompts().create(&draft).await,
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(prompt) => {
                info!("Saved prompt {} ({})", prompt.id, prompt.name);
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error saving prompt: {}", e));
                Outcome::Failed
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> Outcome {
        if !self.ui.confirm("Are you sure you want to delete this prompt?") {
            return Outcome::Cancelled;
        }
        match self.client.prompts().delete(id).await {
            Ok(_) => {
                info!("Deleted prompt {}", id);
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error deleting prompt: {}", e));
                Outcome::Failed
            }
        }
    }

    pub fn render(&self) -> String {
        if self.prompts.is_empty() {
            return "No prompts found. Add your first prompt!".to_string();
        }

        let mut table = Table::new(&[
            "ID",
            "Name",
            "Type",
            "Config",
            "Hashtags",
            "Prompt Text",
            "Status",
        ]);
        for prompt in &self.prompts {
            table.row(vec![
                prompt.id.clone(),
                prompt.name.clone(),
                format!(
                    "{} ({})",
                    prompt.prompt_type.label(),
                    prompt.image_source.label()
                ),
                config_summary(prompt),
                hashtag_summary(&prompt.hashtags),
                truncate(&prompt.prompt_text.replace('\n', " "), PROMPT_TEXT_PREVIEW),
                if prompt.is_active { "Active" } else { "Inactive" }.to_string(),
            ]);
        }
        table.render()
    }
}

fn config_summary(prompt: &Prompt) -> String {
    match prompt.prompt_type {
        PromptType::CelebrityComparison => format!("{} metrics", prompt.metrics.len()),
        PromptType::NewsCollage => format!(
            "{} images",
            prompt
                .image_config
                .as_ref()
                .map(|c| c.collage_count)
                .filter(|n| *n > 0)
                .unwrap_or(4)
        ),
        PromptType::General => "Simple".to_string(),
    }
}

fn hashtag_summary(hashtags: &[String]) -> String {
    if hashtags.is_empty() {
        return "None".to_string();
    }
    let shown = hashtags
        .iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if hashtags.len() > 2 {
        format!("{} ...", shown)
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::testing::Scripted;
    use crate::server::testing::spawn;

    fn form(name: &str, prompt_type: PromptType) -> PromptForm {
        PromptForm {
            name: name.to_string(),
            prompt_type,
            prompt_text: "Compare the careers of two legends in one short paragraph for fans"
                .to_string(),
            hashtags: "#cricket, #legends, #india".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::answering(&[true]));
        let mut view = PromptsView::new(server.client.clone(), ui.clone());
        view.load().await;
        assert!(view.render().starts_with("No prompts found"));

        assert_eq!(
            view.save(&form("Cricket", PromptType::CelebrityComparison), None)
                .await,
            Outcome::Completed
        );
        let id = view.prompts[0].id.clone();

        let mut edit = view.edit_form(&id).unwrap();
        edit.prompt_type = PromptType::NewsCollage;
        edit.collage_count = 6;
        assert_eq!(view.save(&edit, Some(&id)).await, Outcome::Completed);

        let stored = view.prompt(&id).unwrap();
        assert_eq!(stored.prompt_type, PromptType::NewsCollage);
        assert_eq!(stored.image_config.as_ref().unwrap().collage_count, 6);
        assert!(stored.metrics.is_empty());
        assert!(stored.stats_overlay_config.is_none());

        assert_eq!(view.delete(&id).await, Outcome::Completed);
        assert_eq!(
            ui.last_confirmation().as_deref(),
            Some("Are you sure you want to delete this prompt?")
        );
        assert!(view.prompts.is_empty());
        assert!(ui.alerts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_render_columns() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::default());
        let mut view = PromptsView::new(server.client.clone(), ui);
        view.save(&form("Cricket", PromptType::CelebrityComparison), None)
            .await;
        let mut general = form("Daily", PromptType::General);
        general.hashtags.clear();
        view.save(&general, None).await;

        let rendered = view.render();
        assert!(rendered.contains("Celebrity (Real)"));
        assert!(rendered.contains("5 metrics"));
        assert!(rendered.contains("#cricket #legends ..."));
        assert!(rendered.contains("Simple"));
        assert!(rendered.contains("None"));
        assert!(rendered.contains(
            "Compare the careers of two legends in one short paragraph fo..."
        ));
    }

    #[tokio::test]
    async fn test_errors_alert() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::answering(&[true]));
        let mut view = PromptsView::new(server.client.clone(), ui.clone());

        let mut empty = form("", PromptType::General);
        empty.name.clear();
        assert_eq!(view.save(&empty, None).await, Outcome::Failed);
        assert_eq!(
            ui.last_alert().as_deref(),
            Some("Error saving prompt: Name is required")
        );

        assert_eq!(view.delete("missing").await, Outcome::Failed);
        assert_eq!(
            ui.last_alert().as_deref(),
            Some("Error deleting prompt: Prompt not found: missing")
        );
    }
}
