//! HTTP handlers of the reference backend.
//!
//! Successful responses use the `{ "data": ..., "message": ... }` envelope;
//! failures are `{ "message": ... }` with a 4xx status.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::store::{AdminStore, LogQuery, StoreError, StoreResult};
use crate::page_form::PageInput;
use crate::schema::{
    AutomationStatus, BulkResult, DriveFolder, Execution, LogEntry, LogSummary, ManualPost, Page,
    Prompt, TriggerReceipt, TriggerRequest,
};

#[derive(Serialize)]
struct Reply<T> {
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

type ApiReply<T> = StoreResult<Json<Reply<T>>>;

fn data<T>(data: T) -> ApiReply<T> {
    Ok(Json(Reply {
        data,
        message: None,
    }))
}

fn data_with_message<T>(data: T, message: impl Into<String>) -> ApiReply<T> {
    Ok(Json(Reply {
        data,
        message: Some(message.into()),
    }))
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        warn!("Request rejected ({}): {}", status.as_u16(), self);
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// The `/api` routes.
pub fn api() -> Router<AdminStore> {
    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/bulk-enable-schedules", post(bulk_enable_schedules))
        .route("/pages/bulk-disable-schedules", post(bulk_disable_schedules))
        .route("/pages/bulk-clear-timings", post(bulk_clear_timings))
        .route("/pages/bulk-reset-consumed-rows", post(bulk_reset_consumed_rows))
        .route(
            "/pages/:page_id",
            get(get_page).put(update_page).delete(delete_page),
        )
        .route("/pages/:page_id/reset-consumed-rows", post(reset_consumed_rows))
        .route("/prompts", get(list_prompts).post(create_prompt))
        .route(
            "/prompts/:id",
            get(get_prompt).put(update_prompt).delete(delete_prompt),
        )
        .route("/logs", get(list_logs))
        .route("/logs/summary", get(log_summary))
        .route("/automation/status", get(automation_status))
        .route("/automation/trigger", post(trigger))
        .route("/automation/executions", get(executions))
        .route("/drive/folders", get(drive_folders))
        .route("/manual-post", post(manual_post))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

// ============================================================================
// Pages
// ============================================================================

async fn list_pages(State(store): State<AdminStore>) -> ApiReply<Vec<Page>> {
    data(store.list_pages())
}

async fn get_page(
    State(store): State<AdminStore>,
    Path(page_id): Path<String>,
) -> ApiReply<Page> {
    data(store.get_page(&page_id)?)
}

async fn create_page(
    State(store): State<AdminStore>,
    Json(input): Json<PageInput>,
) -> StoreResult<(StatusCode, Json<Reply<Page>>)> {
    let page = store.create_page(input)?;
    info!("Created page {} ({})", page.page_id, page.display_name());
    Ok((
        StatusCode::CREATED,
        Json(Reply {
            data: page,
            message: Some("Page created".to_string()),
        }),
    ))
}

async fn update_page(
    State(store): State<AdminStore>,
    Path(page_id): Path<String>,
    Json(input): Json<PageInput>,
) -> ApiReply<Page> {
    let page = store.update_page(&page_id, input)?;
    info!("Updated page {}", page_id);
    data_with_message(page, "Page updated")
}

async fn delete_page(
    State(store): State<AdminStore>,
    Path(page_id): Path<String>,
) -> ApiReply<Option<()>> {
    store.delete_page(&page_id)?;
    info!("Deleted page {}", page_id);
    data_with_message(None, "Page deleted")
}

async fn reset_consumed_rows(
    State(store): State<AdminStore>,
    Path(page_id): Path<String>,
) -> ApiReply<Option<()>> {
    let cleared = store.reset_consumed_rows(&page_id)?;
    data_with_message(None, format!("Cleared {} consumed row(s)", cleared))
}

async fn bulk_enable_schedules(State(store): State<AdminStore>) -> ApiReply<BulkResult> {
    data(store.set_schedules_enabled(true))
}

async fn bulk_disable_schedules(State(store): State<AdminStore>) -> ApiReply<BulkResult> {
    data(store.set_schedules_enabled(false))
}

async fn bulk_clear_timings(State(store): State<AdminStore>) -> ApiReply<BulkResult> {
    data(store.clear_timings())
}

async fn bulk_reset_consumed_rows(State(store): State<AdminStore>) -> ApiReply<BulkResult> {
    data(store.reset_all_consumed_rows())
}

// ============================================================================
// Prompts
// ============================================================================

async fn list_prompts(State(store): State<AdminStore>) -> ApiReply<Vec<Prompt>> {
    data(store.list_prompts())
}

async fn get_prompt(State(store): State<AdminStore>, Path(id): Path<String>) -> ApiReply<Prompt> {
    data(store.get_prompt(&id)?)
}

async fn create_prompt(
    State(store): State<AdminStore>,
    Json(prompt): Json<Prompt>,
) -> StoreResult<(StatusCode, Json<Reply<Prompt>>)> {
    let prompt = store.create_prompt(prompt)?;
    info!("Created prompt {} ({})", prompt.id, prompt.name);
    Ok((
        StatusCode::CREATED,
        Json(Reply {
            data: prompt,
            message: Some("Prompt created".to_string()),
        }),
    ))
}

async fn update_prompt(
    State(store): State<AdminStore>,
    Path(id): Path<String>,
    Json(prompt): Json<Prompt>,
) -> ApiReply<Prompt> {
    data_with_message(store.update_prompt(&id, prompt)?, "Prompt updated")
}

async fn delete_prompt(
    State(store): State<AdminStore>,
    Path(id): Path<String>,
) -> ApiReply<Option<()>> {
    store.delete_prompt(&id)?;
    data_with_message(None, "Prompt deleted")
}

// ============================================================================
// Logs & automation
// ============================================================================

async fn list_logs(
    State(store): State<AdminStore>,
    Query(query): Query<LogQuery>,
) -> ApiReply<Vec<LogEntry>> {
    data(store.list_logs(&query))
}

async fn log_summary(State(store): State<AdminStore>) -> ApiReply<LogSummary> {
    data(store.log_summary())
}

async fn automation_status(State(store): State<AdminStore>) -> ApiReply<AutomationStatus> {
    data(store.status())
}

async fn trigger(
    State(store): State<AdminStore>,
    Json(request): Json<TriggerRequest>,
) -> ApiReply<TriggerReceipt> {
    let receipt = store.trigger(request.page_id.as_deref())?;
    info!("Trigger accepted for {} page(s)", receipt.page_ids.len());
    let message = format!("Processing {} page(s)", receipt.page_ids.len());
    data_with_message(receipt, message)
}

#[derive(Deserialize)]
struct ExecutionsQuery {
    limit: Option<usize>,
}

async fn executions(
    State(store): State<AdminStore>,
    Query(query): Query<ExecutionsQuery>,
) -> ApiReply<Vec<Execution>> {
    data(store.executions(query.limit))
}

// ============================================================================
// Drive & manual posts
// ============================================================================

async fn drive_folders(State(store): State<AdminStore>) -> ApiReply<Vec<DriveFolder>> {
    data(store.drive_folders())
}

async fn manual_post(
    State(store): State<AdminStore>,
    Json(post): Json<ManualPost>,
) -> ApiReply<Execution> {
    let execution = store.manual_post(&post)?;
    info!("Manual post queued for page {}", post.page_id);
    data_with_message(execution, "Manual post queued")
}
