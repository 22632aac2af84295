//! Dashboard: automation status, log summary and the "post now" trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{local_time, Outcome};
use crate::client::ApiClient;
use crate::interact::Interaction;
use crate::poller::{self, PollHandle};
use crate::schema::{AutomationStatus, LogSummary, Page};

pub const NO_ACTIVE_PAGES: &str =
    "No active pages found. Please add and activate at least one page.";

/// Result of the last manual trigger, shown until the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerNotice {
    pub success: bool,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub struct DashboardView {
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    pub status: Option<AutomationStatus>,
    pub summary: Option<LogSummary>,
    /// Pages that "post now" will target.
    pub active_pages: Vec<Page>,
    pub triggering: bool,
    pub last_trigger: Option<TriggerNotice>,
}

impl DashboardView {
    pub fn new(client: ApiClient, ui: Arc<dyn Interaction>) -> Self {
        Self {
            client,
            ui,
            status: None,
            summary: None,
            active_pages: Vec::new(),
            triggering: false,
            last_trigger: None,
        }
    }

    /// Fetch status, summary and pages together. Any failure clears all
    /// three; the dashboard does not alert on load errors.
    pub async fn load(&mut self) -> Outcome {
        let automation = self.client.automation();
        let logs = self.client.logs();
        let pages = self.client.pages();

        let (status, summary, pages) =
            tokio::join!(automation.status(), logs.summary(), pages.list());

        match (status, summary, pages) {
            (Ok(status), Ok(summary), Ok(pages)) => {
                self.status = Some(status);
                self.summary = Some(summary);
                self.active_pages = pages.into_iter().filter(Page::is_posting_active).collect();
                Outcome::Completed
            }
            (status, summary, pages) => {
                let error = [status.err(), summary.err(), pages.err()]
                    .into_iter()
                    .flatten()
                    .next()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                warn!("Error loading dashboard data: {}", error);
                self.status = None;
                self.summary = None;
                self.active_pages.clear();
                Outcome::Failed
            }
        }
    }

    /// Trigger every active page after confirmation. The outcome is kept in
    /// [`DashboardView::last_trigger`].
    pub async fn trigger_all(&mut self) -> Outcome {
        if self.triggering {
            return Outcome::Blocked;
        }
        if self.active_pages.is_empty() {
            self.ui.alert(NO_ACTIVE_PAGES);
            return Outcome::Blocked;
        }

        let count = self.active_pages.len();
        let names = self
            .active_pages
            .iter()
            .map(|p| format!("• {}", p.display_name()))
            .collect::<Vec<_>>()
            .join("\n");
        let question = format!("Post to {} page(s) now?\n\nPages:\n{}", count, names);
        if !self.ui.confirm(&question) {
            return Outcome::Cancelled;
        }

        self.triggering = true;
        self.last_trigger = None;
        let result = self.client.automation().trigger(None).await;
        self.triggering = false;

        let (success, message, outcome) = match result {
            Ok(receipt) => {
                info!("Trigger accepted for {} page(s)", receipt.page_ids.len());
                (
                    true,
                    format!(
                        "Automation triggered successfully! Processing {} page(s)...",
                        count
                    ),
                    Outcome::Completed,
                )
            }
            Err(e) => (
                false,
                format!("Error triggering automation: {}", e),
                Outcome::Failed,
            ),
        };
        self.last_trigger = Some(TriggerNotice {
            success,
            message,
            at: Utc::now(),
        });
        outcome
    }

    pub fn render(&self) -> String {
        let mut out = Vec::new();

        out.push("Automation".to_string());
        match &self.status {
            Some(status) => {
                out.push(format!("  Active pages:   {}", status.active_pages_count));
                out.push(format!(
                    "  Last execution: {}",
                    local_time(status.last_execution)
                ));
            }
            None => out.push("  Status unavailable".to_string()),
        }

        out.push(String::new());
        out.push("Logs".to_string());
        match &self.summary {
            Some(summary) => {
                out.push(format!("  Total:   {}", summary.total_logs));
                out.push(format!("  Success: {}", summary.success_count));
                out.push(format!("  Errors:  {}", summary.error_count));
            }
            None => out.push("  Summary unavailable".to_string()),
        }

        out.push(String::new());
        if self.active_pages.is_empty() {
            out.push("No active pages".to_string());
        } else {
            out.push(format!("Will post to {} page(s):", self.active_pages.len()));
            for page in &self.active_pages {
                out.push(format!("  • {}", page.display_name()));
            }
        }

        if let Some(notice) = &self.last_trigger {
            out.push(String::new());
            out.push(format!(
                "[{}] {}",
                local_time(Some(notice.at)),
                notice.message
            ));
        }

        out.join("\n")
    }
}

/// Reload every `period`, printing after each refresh.
pub fn watch(view: Arc<Mutex<DashboardView>>, period: Duration) -> PollHandle {
    poller::every("dashboard", period, move || {
        let view = view.clone();
        async move {
            let mut view = view.lock().await;
            view.load().await;
            println!("{}\n", view.render());
        }
    })
}

/// Reload once after `delay`, so a trigger's effects show up.
pub fn refresh_after(view: Arc<Mutex<DashboardView>>, delay: Duration) -> PollHandle {
    poller::after("dashboard-refresh", delay, async move {
        view.lock().await.load().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::testing::Scripted;
    use crate::page_form::{FormMode, PageForm};
    use crate::server::testing::spawn;

    async fn add_page(client: &ApiClient, page_id: &str, name: &str, enabled: bool) {
        let form = PageForm {
            page_id: page_id.to_string(),
            access_token: "tok".to_string(),
            name: name.to_string(),
            schedule_enabled: enabled,
            ..Default::default()
        };
        client
            .pages()
            .create(&form.to_input(FormMode::Create).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_derives_active_pages() {
        let server = spawn().await;
        add_page(&server.client, "1", "Cricket Fans", true).await;
        add_page(&server.client, "2", "Paused", false).await;

        let ui = Arc::new(Scripted::default());
        let mut view = DashboardView::new(server.client.clone(), ui);
        assert_eq!(view.load().await, Outcome::Completed);

        assert_eq!(view.active_pages.len(), 1);
        assert_eq!(view.active_pages[0].page_id, "1");
        assert_eq!(view.status.as_ref().unwrap().active_pages_count, 1);
        assert_eq!(view.summary.as_ref().unwrap().total_logs, 2);
        assert!(view.render().contains("• Cricket Fans"));
    }

    #[tokio::test]
    async fn test_trigger_without_active_pages_is_blocked() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::answering(&[true]));
        let mut view = DashboardView::new(server.client.clone(), ui.clone());
        view.load().await;

        assert_eq!(view.trigger_all().await, Outcome::Blocked);
        assert_eq!(ui.last_alert().as_deref(), Some(NO_ACTIVE_PAGES));
        assert!(ui.confirmations.lock().is_empty());
        assert!(server.store.executions(None).is_empty());
    }

    #[tokio::test]
    async fn test_trigger_confirms_with_page_names() {
        let server = spawn().await;
        add_page(&server.client, "1", "Cricket Fans", true).await;
        add_page(&server.client, "2", "", true).await;

        let ui = Arc::new(Scripted::answering(&[false, true]));
        let mut view = DashboardView::new(server.client.clone(), ui.clone());
        view.load().await;

        assert_eq!(view.trigger_all().await, Outcome::Cancelled);
        assert_eq!(
            ui.last_confirmation().as_deref(),
            Some("Post to 2 page(s) now?\n\nPages:\n• Cricket Fans\n• 2")
        );
        assert!(server.store.executions(None).is_empty());

        assert_eq!(view.trigger_all().await, Outcome::Completed);
        assert!(!view.triggering);
        let notice = view.last_trigger.clone().unwrap();
        assert!(notice.success);
        assert_eq!(
            notice.message,
            "Automation triggered successfully! Processing 2 page(s)..."
        );
        assert_eq!(server.store.executions(None).len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_failure_is_recorded() {
        let server = spawn().await;
        add_page(&server.client, "1", "Cricket Fans", true).await;

        let ui = Arc::new(Scripted::answering(&[true]));
        let mut view = DashboardView::new(server.client.clone(), ui);
        view.load().await;

        // The backend goes away between load and trigger.
        let client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        view.client = client;

        assert_eq!(view.trigger_all().await, Outcome::Failed);
        assert!(!view.triggering);
        let notice = view.last_trigger.unwrap();
        assert!(!notice.success);
        assert!(notice.message.starts_with("Error triggering automation: "));
    }

    #[tokio::test]
    async fn test_load_failure_clears_everything() {
        let server = spawn().await;
        add_page(&server.client, "1", "Cricket Fans", true).await;

        let ui = Arc::new(Scripted::default());
        let mut view = DashboardView::new(server.client.clone(), ui.clone());
        view.load().await;
        assert!(view.status.is_some());

        view.client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(view.load().await, Outcome::Failed);
        assert!(view.status.is_none());
        assert!(view.summary.is_none());
        assert!(view.active_pages.is_empty());
        assert!(ui.alerts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_after_reloads() {
        let server = spawn().await;
        let ui = Arc::new(Scripted::default());
        let view = Arc::new(Mutex::new(DashboardView::new(server.client.clone(), ui)));

        add_page(&server.client, "1", "Cricket Fans", true).await;
        refresh_after(view.clone(), Duration::from_millis(10))
            .join()
            .await;
        assert_eq!(view.lock().await.active_pages.len(), 1);
    }
}
