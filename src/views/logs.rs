//! Logs: filtered audit log, optionally followed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::warn;

use super::{local_time, Outcome, Table};
use crate::api::LogFilter;
use crate::client::ApiClient;
use crate::poller::{self, PollHandle};
use crate::schema::LogEntry;

pub struct LogsView {
    client: ApiClient,
    pub filter: LogFilter,
    pub logs: Vec<LogEntry>,
}

impl LogsView {
    pub fn new(client: ApiClient, filter: LogFilter) -> Self {
        Self {
            client,
            filter,
            logs: Vec::new(),
        }
    }

    /// A failed load keeps the rows already shown.
    pub async fn load(&mut self) -> Outcome {
        match self.client.logs().list(&self.filter).await {
            Ok(logs) => {
                self.logs = logs;
                Outcome::Completed
            }
            Err(e) => {
                warn!("Error loading logs: {}", e);
                Outcome::Failed
            }
        }
    }

    /// Replace the filters and fetch again.
    #[cfg(test)]
    pub async fn set_filter(&mut self, filter: LogFilter) -> Outcome {
        self.filter = filter;
        self.load().await
    }

    pub fn render(&self) -> String {
        if self.logs.is_empty() {
            return "No logs found".to_string();
        }

        let mut table = Table::new(&["Timestamp", "Type", "Level", "Message", "Details"]);
        for log in &self.logs {
            let mut details = Vec::new();
            if let Some(page_id) = &log.page_id {
                details.push(format!("Page: {}", page_id));
            }
            if let Some(error) = &log.error {
                details.push(error.clone());
            }
            table.row(vec![
                local_time(Some(log.timestamp)),
                log.log_type.clone().unwrap_or_else(|| "N/A".to_string()),
                log.level
                    .map(|l| l.as_str().to_uppercase())
                    .unwrap_or_else(|| "N/A".to_string()),
                log.message.clone(),
                details.join("; "),
            ]);
        }
        table.render()
    }
}

/// Reload every `period`, printing after each refresh.
pub fn follow(view: Arc<Mutex<LogsView>>, period: Duration) -> PollHandle {
    poller::every("logs", period, move || {
        let view = view.clone();
        async move {
            let mut view = view.lock().await;
            view.load().await;
            println!("{}\n", view.render());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_form::{FormMode, PageForm};
    use crate::schema::LogLevel;
    use crate::server::testing::spawn;

    #[tokio::test]
    async fn test_filters_and_render() {
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
        server.client.automation().trigger(None).await.unwrap();
        server
            .store
            .record_error("post_execution", "Post failed", Some("123"), "token expired");

        let mut view = LogsView::new(server.client.clone(), LogFilter::default());
        assert_eq!(view.load().await, Outcome::Completed);
        assert_eq!(view.logs.len(), 3);

        view.set_filter(LogFilter {
            level: Some(LogLevel::Error),
            ..Default::default()
        })
        .await;
        assert_eq!(view.logs.len(), 1);
        let rendered = view.render();
        assert!(rendered.contains("ERROR"));
        assert!(rendered.contains("Page: 123; token expired"));

        view.set_filter(LogFilter {
            log_type: Some("operation".to_string()),
            ..Default::default()
        })
        .await;
        assert_eq!(view.logs.len(), 1);
        assert_eq!(view.logs[0].message, "Page created: 123");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_rows() {
        let server = spawn().await;
        let form = PageForm {
            page_id: "1".to_string(),
            access_token: "tok".to_string(),
            ..Default::default()
        };
        server
            .client
            .pages()
            .create(&form.to_input(FormMode::Create).unwrap())
            .await
            .unwrap();

        let mut view = LogsView::new(server.client.clone(), LogFilter::default());
        view.load().await;
        assert_eq!(view.logs.len(), 1);

        view.client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(view.load().await, Outcome::Failed);
        assert_eq!(view.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_follow_stops_when_dropped() {
        let server = spawn().await;
        let view = Arc::new(Mutex::new(LogsView::new(
            server.client.clone(),
            LogFilter::default(),
        )));

        let handle = follow(view.clone(), Duration::from_millis(50));
        let form = PageForm {
            page_id: "1".to_string(),
            access_token: "tok".to_string(),
            ..Default::default()
        };
        server
            .store
            .create_page(form.to_input(FormMode::Create).unwrap())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!handle.is_finished());
        assert_eq!(view.lock().await.logs.len(), 1);

        drop(handle);
        server.store.delete_page("1").unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(server.store.log_summary().total_logs, 2);
        assert_eq!(view.lock().await.logs.len(), 1);
    }
}
