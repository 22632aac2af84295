//! In-memory state of the reference backend.
//!
//! Holds pages, prompts, the audit log and executions behind one lock.
//! Every mutation appends an `operation` log entry.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::page_form::PageInput;
use crate::schema::{
    AutomationStatus, BulkResult, DriveFolder, Execution, ExecutionTrigger, LogEntry, LogLevel,
    LogSummary, ManualPost, Page, Prompt, TriggerReceipt,
};

const DEFAULT_LOG_LIMIT: usize = 100;
const DEFAULT_EXECUTION_LIMIT: usize = 20;

/// Retention of the serve process; the oldest entries are dropped first.
const MAX_LOGS: usize = 5_000;
const MAX_EXECUTIONS: usize = 1_000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query of `GET /logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    #[serde(rename = "type", default)]
    pub log_type: Option<String>,
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Default)]
struct Inner {
    pages: Vec<Page>,
    prompts: Vec<Prompt>,
    logs: VecDeque<LogEntry>,
    executions: VecDeque<Execution>,
    drive_folders: Vec<DriveFolder>,
    last_execution: Option<DateTime<Utc>>,
}

impl Inner {
    fn page_mut(&mut self, page_id: &str) -> StoreResult<&mut Page> {
        self.pages
            .iter_mut()
            .find(|p| p.page_id == page_id)
            .ok_or_else(|| page_not_found(page_id))
    }

    fn prompt_name(&self, prompt_id: Option<&str>) -> Option<String> {
        let prompt_id = prompt_id?;
        self.prompts
            .iter()
            .find(|p| p.id == prompt_id)
            .map(|p| p.name.clone())
    }

    fn check_prompt(&self, prompt_id: Option<&str>) -> StoreResult<()> {
        match prompt_id {
            Some(id) if !self.prompts.iter().any(|p| p.id == id) => {
                Err(StoreError::Invalid(format!("Prompt not found: {}", id)))
            }
            _ => Ok(()),
        }
    }

    /// Client view of a page: no token, prompt name resolved.
    fn present(&self, page: &Page) -> Page {
        let mut out = page.redacted();
        out.prompt_name = self.prompt_name(page.prompt_id.as_deref());
        out
    }

    fn log(&mut self, level: LogLevel, log_type: &str, message: String, page_id: Option<&str>) {
        debug!("[{}] {}", log_type, message);
        push_bounded(
            &mut self.logs,
            LogEntry {
                timestamp: Utc::now(),
                log_type: Some(log_type.to_string()),
                level: Some(level),
                message,
                page_id: page_id.map(str::to_string),
                error: None,
            },
            MAX_LOGS,
        );
    }

    fn record_execution(
        &mut self,
        page_id: &str,
        trigger: ExecutionTrigger,
        message: String,
    ) -> Execution {
        let now = Utc::now();
        let execution = Execution {
            id: Uuid::new_v4().simple().to_string(),
            page_id: page_id.to_string(),
            trigger,
            status: "queued".to_string(),
            created_at: now,
            message: Some(message.clone()),
        };
        push_bounded(&mut self.executions, execution.clone(), MAX_EXECUTIONS);
        self.last_execution = Some(now);
        self.log(LogLevel::Info, "post_execution", message, Some(page_id));
        execution
    }
}

fn push_bounded<T>(entries: &mut VecDeque<T>, entry: T, cap: usize) {
    if entries.len() >= cap {
        entries.pop_front();
    }
    entries.push_back(entry);
}

fn page_not_found(page_id: &str) -> StoreError {
    StoreError::NotFound(format!("Page not found: {}", page_id))
}

fn prompt_not_found(id: &str) -> StoreError {
    StoreError::NotFound(format!("Prompt not found: {}", id))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Shared handle to the backend state. Cheap to clone.
#[derive(Clone, Default)]
pub struct AdminStore {
    inner: Arc<RwLock<Inner>>,
}

impl AdminStore {
    pub fn new(drive_folders: Vec<DriveFolder>) -> Self {
        let store = Self::default();
        store.inner.write().drive_folders = drive_folders;
        store
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    pub fn list_pages(&self) -> Vec<Page> {
        let inner = self.inner.read();
        inner.pages.iter().map(|p| inner.present(p)).collect()
    }

    pub fn get_page(&self, page_id: &str) -> StoreResult<Page> {
        let inner = self.inner.read();
        inner
            .pages
            .iter()
            .find(|p| p.page_id == page_id)
            .map(|p| inner.present(p))
            .ok_or_else(|| page_not_found(page_id))
    }

    pub fn create_page(&self, input: PageInput) -> StoreResult<Page> {
        let page_id = non_empty(input.page_id.as_deref())
            .ok_or_else(|| StoreError::Invalid("pageId is required".to_string()))?
            .to_string();
        let access_token = non_empty(input.access_token.as_deref())
            .ok_or_else(|| StoreError::Invalid("accessToken is required".to_string()))?
            .to_string();

        let mut inner = self.inner.write();
        if inner.pages.iter().any(|p| p.page_id == page_id) {
            return Err(StoreError::Conflict(format!(
                "Page already exists: {}",
                page_id
            )));
        }
        let prompt_id = input.prompt_ref();
        inner.check_prompt(prompt_id.as_deref())?;

        let page = Page {
            id: Some(Uuid::new_v4().simple().to_string()),
            page_id: page_id.clone(),
            name: input.name.trim().to_string(),
            access_token: Some(access_token),
            prompt_id,
            prompt_name: None,
            is_active: input.is_active,
            posting_schedule: input.posting_schedule(None),
            drive_folder_id: input.drive_folder_id.clone(),
            drive_folder_name: input.drive_folder_name.clone(),
            google_sheet_id: input.google_sheet_id.clone(),
            google_sheet_range: input.google_sheet_range.clone(),
            consumed_rows: Vec::new(),
        };
        inner.pages.push(page.clone());
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Page created: {}", page_id),
            Some(&page_id),
        );
        Ok(inner.present(&page))
    }

    /// Replace editable fields. `pageId` is immutable; the access token is
    /// only replaced when one is supplied.
    pub fn update_page(&self, page_id: &str, input: PageInput) -> StoreResult<Page> {
        let mut inner = self.inner.write();
        let prompt_id = input.prompt_ref();
        inner.check_prompt(prompt_id.as_deref())?;

        let page = inner.page_mut(page_id)?;
        page.name = input.name.trim().to_string();
        if let Some(token) = non_empty(input.access_token.as_deref()) {
            page.access_token = Some(token.to_string());
        }
        page.prompt_id = prompt_id;
        page.is_active = input.is_active;
        page.posting_schedule = input.posting_schedule(Some(&page.posting_schedule));
        if input.drive_folder_id.is_some() {
            page.drive_folder_id = input.drive_folder_id.clone();
            page.drive_folder_name = input.drive_folder_name.clone();
        }
        if input.google_sheet_id.is_some() {
            page.google_sheet_id = input.google_sheet_id.clone();
            page.google_sheet_range = input.google_sheet_range.clone();
        }
        let updated = page.clone();

        inner.log(
            LogLevel::Info,
            "operation",
            format!("Page updated: {}", page_id),
            Some(page_id),
        );
        Ok(inner.present(&updated))
    }

    pub fn delete_page(&self, page_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let before = inner.pages.len();
        inner.pages.retain(|p| p.page_id != page_id);
        if inner.pages.len() == before {
            return Err(page_not_found(page_id));
        }
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Page deleted: {}", page_id),
            Some(page_id),
        );
        Ok(())
    }

    /// Returns how many rows were cleared.
    pub fn reset_consumed_rows(&self, page_id: &str) -> StoreResult<usize> {
        let mut inner = self.inner.write();
        let page = inner.page_mut(page_id)?;
        let cleared = page.consumed_rows.len();
        page.consumed_rows.clear();
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Consumed rows reset for page {} ({} rows)", page_id, cleared),
            Some(page_id),
        );
        Ok(cleared)
    }

    /// Append consumed row identifiers, as the content pipeline does.
    #[cfg(test)]
    pub fn consume_rows(&self, page_id: &str, rows: Vec<serde_json::Value>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.page_mut(page_id)?.consumed_rows.extend(rows);
        Ok(())
    }

    pub fn set_schedules_enabled(&self, enabled: bool) -> BulkResult {
        self.bulk(
            if enabled {
                "Schedules enabled"
            } else {
                "Schedules disabled"
            },
            |page| {
                let changed = page.posting_schedule.enabled != Some(enabled);
                page.posting_schedule.enabled = Some(enabled);
                changed
            },
        )
    }

    /// Forget `lastPostedAt` everywhere so schedules start fresh.
    pub fn clear_timings(&self) -> BulkResult {
        self.bulk("Posting timings cleared", |page| {
            page.posting_schedule.last_posted_at.take().is_some()
        })
    }

    pub fn reset_all_consumed_rows(&self) -> BulkResult {
        self.bulk("Consumed rows reset", |page| {
            let had_rows = !page.consumed_rows.is_empty();
            page.consumed_rows.clear();
            had_rows
        })
    }

    fn bulk<F>(&self, what: &str, mut apply: F) -> BulkResult
    where
        F: FnMut(&mut Page) -> bool,
    {
        let mut inner = self.inner.write();
        let modified_count = inner.pages.iter_mut().map(|p| apply(p)).filter(|c| *c).count() as u64;
        inner.log(
            LogLevel::Info,
            "operation",
            format!("{} ({} page(s) modified)", what, modified_count),
            None,
        );
        BulkResult { modified_count }
    }

    /// Stamp `lastPostedAt`, as the posting pipeline does after a post.
    #[cfg(test)]
    pub fn mark_posted(&self, page_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.page_mut(page_id)?.posting_schedule.last_posted_at = Some(at);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------------

    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.inner.read().prompts.clone()
    }

    pub fn get_prompt(&self, id: &str) -> StoreResult<Prompt> {
        self.inner
            .read()
            .prompts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| prompt_not_found(id))
    }

    pub fn create_prompt(&self, mut prompt: Prompt) -> StoreResult<Prompt> {
        validate_prompt(&prompt)?;
        prompt.id = Uuid::new_v4().simple().to_string();

        let mut inner = self.inner.write();
        inner.prompts.push(prompt.clone());
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Prompt created: {}", prompt.name),
            None,
        );
        Ok(prompt)
    }

    pub fn update_prompt(&self, id: &str, mut prompt: Prompt) -> StoreResult<Prompt> {
        validate_prompt(&prompt)?;
        prompt.id = id.to_string();

        let mut inner = self.inner.write();
        let slot = inner
            .prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| prompt_not_found(id))?;
        *slot = prompt.clone();
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Prompt updated: {}", prompt.name),
            None,
        );
        Ok(prompt)
    }

    /// Deleting a prompt unassigns it from every page that used it.
    pub fn delete_prompt(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let before = inner.prompts.len();
        inner.prompts.retain(|p| p.id != id);
        if inner.prompts.len() == before {
            return Err(prompt_not_found(id));
        }
        for page in inner.pages.iter_mut() {
            if page.prompt_id.as_deref() == Some(id) {
                page.prompt_id = None;
            }
        }
        inner.log(
            LogLevel::Info,
            "operation",
            format!("Prompt deleted: {}", id),
            None,
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Logs & automation
    // ------------------------------------------------------------------------

    /// Newest first.
    pub fn list_logs(&self, query: &LogQuery) -> Vec<LogEntry> {
        let log_type = non_empty(query.log_type.as_deref());
        let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);

        self.inner
            .read()
            .logs
            .iter()
            .rev()
            .filter(|l| log_type.map_or(true, |t| l.log_type.as_deref() == Some(t)))
            .filter(|l| query.level.map_or(true, |lvl| l.level == Some(lvl)))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn log_summary(&self) -> LogSummary {
        let inner = self.inner.read();
        LogSummary {
            total_logs: inner.logs.len() as u64,
            success_count: inner
                .logs
                .iter()
                .filter(|l| {
                    l.log_type.as_deref() == Some("post_execution")
                        && l.level == Some(LogLevel::Info)
                })
                .count() as u64,
            error_count: inner
                .logs
                .iter()
                .filter(|l| l.level == Some(LogLevel::Error))
                .count() as u64,
        }
    }

    /// Record a failure reported by the posting pipeline.
    #[cfg(test)]
    pub fn record_error(&self, log_type: &str, message: &str, page_id: Option<&str>, error: &str) {
        let mut inner = self.inner.write();
        inner.log(LogLevel::Error, log_type, message.to_string(), page_id);
        if let Some(entry) = inner.logs.back_mut() {
            entry.error = Some(error.to_string());
        }
    }

    pub fn status(&self) -> AutomationStatus {
        let inner = self.inner.read();
        AutomationStatus {
            active_pages_count: inner.pages.iter().filter(|p| p.is_posting_active()).count()
                as u32,
            last_execution: inner.last_execution,
        }
    }

    /// Queue a run for one page (which must exist and be active) or for
    /// every posting-active page.
    pub fn trigger(&self, page_id: Option<&str>) -> StoreResult<TriggerReceipt> {
        let mut inner = self.inner.write();

        let targets: Vec<String> = match non_empty(page_id) {
            Some(id) => {
                let page = inner.page_mut(id)?;
                if !page.is_active {
                    return Err(StoreError::Invalid(format!("Page is not active: {}", id)));
                }
                vec![page.page_id.clone()]
            }
            None => inner
                .pages
                .iter()
                .filter(|p| p.is_posting_active())
                .map(|p| p.page_id.clone())
                .collect(),
        };

        for target in &targets {
            inner.record_execution(
                target,
                ExecutionTrigger::Manual,
                format!("Manual trigger queued for page {}", target),
            );
        }
        if targets.is_empty() {
            inner.log(
                LogLevel::Warn,
                "operation",
                "Trigger requested but no active pages".to_string(),
                None,
            );
        }

        Ok(TriggerReceipt { page_ids: targets })
    }

    /// Newest first.
    pub fn executions(&self, limit: Option<usize>) -> Vec<Execution> {
        self.inner
            .read()
            .executions
            .iter()
            .rev()
            .take(limit.unwrap_or(DEFAULT_EXECUTION_LIMIT))
            .cloned()
            .collect()
    }

    pub fn manual_post(&self, post: &ManualPost) -> StoreResult<Execution> {
        let missing = [
            ("pageId", &post.page_id),
            ("celebrityA", &post.celebrity_a),
            ("urlA", &post.url_a),
            ("celebrityB", &post.celebrity_b),
            ("urlB", &post.url_b),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((field, _)) = missing {
            return Err(StoreError::Invalid(format!("{} is required", field)));
        }

        let mut inner = self.inner.write();
        inner.page_mut(&post.page_id)?;
        Ok(inner.record_execution(
            &post.page_id,
            ExecutionTrigger::ManualPost,
            format!(
                "Manual post queued for page {}: {} vs {}",
                post.page_id, post.celebrity_a, post.celebrity_b
            ),
        ))
    }

    pub fn drive_folders(&self) -> Vec<DriveFolder> {
        self.inner.read().drive_folders.clone()
    }
}

fn validate_prompt(prompt: &Prompt) -> StoreResult<()> {
    if prompt.name.trim().is_empty() {
        return Err(StoreError::Invalid("name is required".to_string()));
    }
    if prompt.prompt_text.trim().is_empty() {
        return Err(StoreError::Invalid("promptText is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_form::ScheduleType;
    use serde_json::json;

    fn input(page_id: &str) -> PageInput {
        PageInput {
            page_id: Some(page_id.to_string()),
            access_token: Some("tok".to_string()),
            name: format!("Page {}", page_id),
            schedule_type: ScheduleType::Interval,
            interval_hours: Some(3),
            schedule_enabled: true,
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_requires_credentials_and_unique_id() {
        let store = AdminStore::default();
        let mut bad = input("1");
        bad.access_token = None;
        assert!(matches!(store.create_page(bad), Err(StoreError::Invalid(_))));

        store.create_page(input("1")).unwrap();
        assert!(matches!(
            store.create_page(input("1")),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_update_keeps_token_and_last_posted() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();
        let posted = Utc::now();
        store.mark_posted("1", posted).unwrap();

        let mut update = input("1");
        update.page_id = None;
        update.access_token = None;
        update.schedule_type = ScheduleType::Cron;
        update.cron_expression = Some("0 9 * * *".to_string());
        let page = store.update_page("1", update).unwrap();

        assert_eq!(page.posting_schedule.cron_expression.as_deref(), Some("0 9 * * *"));
        assert_eq!(page.posting_schedule.interval_hours, None);
        assert_eq!(page.posting_schedule.last_posted_at, Some(posted));
        assert!(page.access_token.is_none());
        assert_eq!(
            store.inner.read().pages[0].access_token.as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn test_bulk_operations_count_changes() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();
        let mut disabled = input("2");
        disabled.schedule_enabled = false;
        store.create_page(disabled).unwrap();

        assert_eq!(store.set_schedules_enabled(true).modified_count, 1);
        assert_eq!(store.set_schedules_enabled(false).modified_count, 2);

        store.mark_posted("2", Utc::now()).unwrap();
        assert_eq!(store.clear_timings().modified_count, 1);

        store.consume_rows("1", vec![json!(4), json!(5)]).unwrap();
        assert_eq!(store.reset_all_consumed_rows().modified_count, 1);
        assert!(store.get_page("1").unwrap().consumed_rows.is_empty());
    }

    #[test]
    fn test_trigger_targets_active_pages() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();
        let mut inactive = input("2");
        inactive.is_active = false;
        store.create_page(inactive).unwrap();

        let receipt = store.trigger(None).unwrap();
        assert_eq!(receipt.page_ids, vec!["1"]);
        assert!(matches!(store.trigger(Some("2")), Err(StoreError::Invalid(_))));
        assert!(matches!(store.trigger(Some("9")), Err(StoreError::NotFound(_))));

        assert_eq!(store.status().active_pages_count, 1);
        assert!(store.status().last_execution.is_some());
        assert_eq!(store.executions(None).len(), 1);
    }

    #[test]
    fn test_logs_newest_first_and_filtered() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();
        store.trigger(None).unwrap();
        store.record_error("post_execution", "Post failed", Some("1"), "token expired");

        let all = store.list_logs(&LogQuery::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "Post failed");
        assert_eq!(all[0].error.as_deref(), Some("token expired"));

        let errors = store.list_logs(&LogQuery {
            level: Some(LogLevel::Error),
            ..Default::default()
        });
        assert_eq!(errors.len(), 1);

        let ops = store.list_logs(&LogQuery {
            log_type: Some("operation".to_string()),
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(ops.len(), 1);

        let summary = store.log_summary();
        assert_eq!(summary.total_logs, 3);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.error_count, 1);
    }

    #[test]
    fn test_logs_and_executions_are_bounded() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();
        for n in 0..MAX_EXECUTIONS + 5 {
            store.trigger(Some("1")).unwrap();
            if n == 0 {
                assert_eq!(store.executions(None).len(), 1);
            }
        }
        assert_eq!(store.executions(Some(usize::MAX)).len(), MAX_EXECUTIONS);

        for n in 0..MAX_LOGS {
            store.record_error("post_execution", &format!("failure {}", n), None, "boom");
        }
        let summary = store.log_summary();
        assert_eq!(summary.total_logs, MAX_LOGS as u64);
        assert_eq!(summary.error_count, MAX_LOGS as u64);

        let newest = store.list_logs(&LogQuery {
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(newest[0].message, format!("failure {}", MAX_LOGS - 1));
    }

    #[test]
    fn test_delete_prompt_unassigns_pages() {
        let store = AdminStore::default();
        let prompt: Prompt = serde_json::from_value(json!({
            "name": "Daily",
            "promptText": "Write a post",
            "isActive": true
        }))
        .unwrap();
        let prompt = store.create_prompt(prompt).unwrap();

        let mut page = input("1");
        page.prompt_id = Some(prompt.id.clone());
        let page = store.create_page(page).unwrap();
        assert_eq!(page.prompt_name.as_deref(), Some("Daily"));

        store.delete_prompt(&prompt.id).unwrap();
        let page = store.get_page("1").unwrap();
        assert!(page.prompt_id.is_none());
        assert!(page.prompt_name.is_none());
    }

    #[test]
    fn test_manual_post_validation() {
        let store = AdminStore::default();
        store.create_page(input("1")).unwrap();

        let mut post = ManualPost {
            page_id: "1".to_string(),
            celebrity_a: "A".to_string(),
            url_a: "https://img/a.png".to_string(),
            celebrity_b: "B".to_string(),
            url_b: String::new(),
        };
        assert!(matches!(store.manual_post(&post), Err(StoreError::Invalid(m)) if m == "urlB is required"));

        post.url_b = "https://img/b.png".to_string();
        let execution = store.manual_post(&post).unwrap();
        assert_eq!(execution.trigger, ExecutionTrigger::ManualPost);
    }
}
