//! Pages: CRUD, bulk schedule operations and per-page posting.

use std::sync::Arc;

use tracing::{info, warn};

use super::manual_post::ManualPostModal;
use super::{local_time, Outcome, Table};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::interact::Interaction;
use crate::page_form::{FormMode, PageForm};
use crate::schema::{BulkResult, DriveFolder, Page, Prompt};

pub struct PagesView {
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    pub pages: Vec<Page>,
    pub prompts: Vec<Prompt>,
    /// Choices for the page's content folder. Empty when the backend has
    /// no Drive integration.
    pub drive_folders: Vec<DriveFolder>,
    pub triggering: bool,
    /// Page currently being posted to, if any.
    pub posting_page_id: Option<String>,
}

impl PagesView {
    pub fn new(client: ApiClient, ui: Arc<dyn Interaction>) -> Self {
        Self {
            client,
            ui,
            pages: Vec::new(),
            prompts: Vec::new(),
            drive_folders: Vec::new(),
            triggering: false,
            posting_page_id: None,
        }
    }

    pub async fn load(&mut self) -> Outcome {
        let pages_api = self.client.pages();
        let prompts_api = self.client.prompts();
        let drive_api = self.client.drive();

        let (pages, prompts, folders) =
            tokio::join!(pages_api.list(), prompts_api.list(), drive_api.folders());

        self.drive_folders = folders.unwrap_or_else(|e| {
            warn!("Drive folders unavailable: {}", e);
            Vec::new()
        });

        match (pages, prompts) {
            (Ok(pages), Ok(prompts)) => {
                self.pages = pages;
                self.prompts = prompts;
                Outcome::Completed
            }
            (Err(e), _) | (_, Err(e)) => {
                self.ui.alert(&format!("Error loading data: {}", e));
                self.pages.clear();
                self.prompts.clear();
                Outcome::Failed
            }
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }

    /// Prefilled form for editing `page_id`.
    pub fn edit_form(&self, page_id: &str) -> Option<PageForm> {
        self.page(page_id).map(PageForm::from_page)
    }

    pub fn active_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_posting_active()).count()
    }

    /// Create or update from the form, then reload.
    pub async fn save(&mut self, form: &PageForm, mode: FormMode) -> Outcome {
        let result = match form.to_input(mode) {
            Ok(input) => match mode {
                FormMode::Create => self.client.pages().create(&input).await,
                FormMode::Update => self.client.pages().update(&form.page_id, &input).await,
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(page) => {
                info!("Saved page {}", page.page_id);
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error saving page: {}", e));
                Outcome::Failed
            }
        }
    }

    pub async fn delete(&mut self, page_id: &str) -> Outcome {
        if !self.ui.confirm("Are you sure you want to delete this page?") {
            return Outcome::Cancelled;
        }
        match self.client.pages().delete(page_id).await {
            Ok(_) => {
                info!("Deleted page {}", page_id);
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error deleting page: {}", e));
                Outcome::Failed
            }
        }
    }

    /// Make every sheet row of one page available for posting again.
    pub async fn reset_consumed_rows(&mut self, page_id: &str) -> Outcome {
        let question = format!(
            "Reset consumed rows for page {}? Previously used rows will be posted again.",
            page_id
        );
        if !self.ui.confirm(&question) {
            return Outcome::Cancelled;
        }
        match self.client.pages().reset_consumed_rows(page_id).await {
            Ok(message) => {
                self.ui
                    .alert(message.as_deref().unwrap_or("Consumed rows reset."));
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui
                    .alert(&format!("Error resetting consumed rows: {}", e));
                Outcome::Failed
            }
        }
    }

    /// Whether the bulk toggle currently offers "disable all".
    pub fn all_schedules_enabled(&self) -> bool {
        !self.pages.is_empty()
            && self
                .pages
                .iter()
                .all(|p| p.posting_schedule.is_enabled())
    }

    /// Disable every schedule when all are enabled, otherwise enable all.
    pub async fn toggle_all_schedules(&mut self) -> Outcome {
        let disable = self.all_schedules_enabled();
        let verb = if disable { "Disable" } else { "Enable" };
        let question = format!("{} schedules for all {} page(s)?", verb, self.pages.len());
        if !self.ui.confirm(&question) {
            return Outcome::Cancelled;
        }

        let result = if disable {
            self.client.pages().bulk_disable_schedules().await
        } else {
            self.client.pages().bulk_enable_schedules().await
        };
        let done = if disable { "disabled" } else { "enabled" };
        self.finish_bulk(
            result,
            |n| format!("Schedules {} on {} page(s).", done, n),
            "updating schedules",
        )
        .await
    }

    /// Forget when each page last posted so every schedule starts fresh.
    pub async fn clear_all_timings(&mut self) -> Outcome {
        if !self
            .ui
            .confirm("Clear posting timings for all pages? Every schedule will start fresh.")
        {
            return Outcome::Cancelled;
        }
        let result = self.client.pages().bulk_clear_timings().await;
        self.finish_bulk(
            result,
            |n| format!("Cleared timings on {} page(s).", n),
            "clearing timings",
        )
        .await
    }

    pub async fn reset_all_consumed_rows(&mut self) -> Outcome {
        if !self.ui.confirm(
            "Reset consumed rows for all pages? Previously used rows will be posted again.",
        ) {
            return Outcome::Cancelled;
        }
        let result = self.client.pages().bulk_reset_consumed_rows().await;
        self.finish_bulk(
            result,
            |n| format!("Reset consumed rows on {} page(s).", n),
            "resetting consumed rows",
        )
        .await
    }

    async fn finish_bulk<F>(
        &mut self,
        result: ApiResult<BulkResult>,
        done: F,
        what: &str,
    ) -> Outcome
    where
        F: FnOnce(u64) -> String,
    {
        match result {
            Ok(bulk) => {
                self.ui.alert(&done(bulk.modified_count));
                self.load().await;
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error {}: {}", what, e));
                Outcome::Failed
            }
        }
    }

    /// Trigger every active page.
    pub async fn post_all_active(&mut self) -> Outcome {
        if self.triggering {
            return Outcome::Blocked;
        }
        let count = self.active_count();
        if count == 0 {
            self.ui
                .alert("No active pages found. Please activate at least one page.");
            return Outcome::Blocked;
        }
        if !self
            .ui
            .confirm(&format!("Post to {} active page(s) now?", count))
        {
            return Outcome::Cancelled;
        }

        self.triggering = true;
        let result = self.client.automation().trigger(None).await;
        self.triggering = false;

        match result {
            Ok(_) => {
                self.ui.alert(&format!(
                    "Automation triggered! Processing {} page(s)...",
                    count
                ));
                Outcome::Completed
            }
            Err(e) => {
                self.ui
                    .alert(&format!("Error triggering automation: {}", e));
                Outcome::Failed
            }
        }
    }

    /// Trigger one page. Inactive pages are refused before asking.
    pub async fn post_page(&mut self, page_id: &str) -> Outcome {
        if self.posting_page_id.is_some() {
            return Outcome::Blocked;
        }
        let Some(page) = self.page(page_id) else {
            self.ui.alert(&format!("Page not found: {}", page_id));
            return Outcome::Blocked;
        };
        if !page.is_active {
            self.ui
                .alert("This page is not active. Please activate it first.");
            return Outcome::Blocked;
        }
        let name = page.name.clone();
        if !self
            .ui
            .confirm(&format!("Post to \"{}\" ({}) now?", name, page_id))
        {
            return Outcome::Cancelled;
        }

        self.posting_page_id = Some(page_id.to_string());
        let result = self.client.automation().trigger(Some(page_id)).await;
        self.posting_page_id = None;

        match result {
            Ok(_) => {
                self.ui.alert(&format!(
                    "Posting to \"{}\"... Check logs for progress.",
                    name
                ));
                Outcome::Completed
            }
            Err(e) => {
                self.ui.alert(&format!("Error posting to page: {}", e));
                Outcome::Failed
            }
        }
    }

    /// Manual post form bound to `page_id`.
    pub fn manual_post(&self, page_id: &str) -> ManualPostModal {
        ManualPostModal::open(self.client.clone(), self.ui.clone(), page_id)
    }

    /// Prompt column: the server-filled name, else a lookup in the loaded
    /// prompts.
    fn prompt_label(&self, page: &Page) -> String {
        page.prompt_name
            .clone()
            .or_else(|| {
                let id = page.prompt_id.as_deref()?;
                self.prompts
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| p.name.clone())
            })
            .unwrap_or_else(|| "Not assigned".to_string())
    }

    pub fn render(&self) -> String {
        if self.pages.is_empty() {
            return "No pages found. Add your first page!".to_string();
        }

        let mut table = Table::new(&[
            "Page ID",
            "Name",
            "Prompt",
            "Schedule",
            "Status",
            "Last Posted",
        ]);
        for page in &self.pages {
            let schedule = &page.posting_schedule;
            let mut cadence = schedule.describe();
            if !schedule.is_enabled() {
                cadence.push_str(" (Disabled)");
            }
            table.row(vec![
                page.page_id.clone(),
                page.name.clone(),
                self.prompt_label(page),
                cadence,
                if page.is_active { "Active" } else { "Inactive" }.to_string(),
                local_time(schedule.last_posted_at),
            ]);
        }
        format!(
            "{}\n\n{} of {} page(s) active",
            table.render(),
            self.active_count(),
            self.pages.len()
        )
    }
}
