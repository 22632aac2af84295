//! Wire types exchanged with the automation backend.
//!
//! Keys are camelCase on the wire and server-assigned ids travel as `_id`.
//! Readers are lenient (missing lists, `null`s, comma-joined strings) because
//! the backend has accumulated records from several dashboard generations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Pages
// ============================================================================

/// A posting destination: page credentials plus its schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub page_id: String,
    #[serde(default)]
    pub name: String,
    /// Write-only secret. Servers are expected to omit it from responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
    /// Denormalised prompt name, filled in by the server for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub posting_schedule: PostingSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_range: Option<String>,
    /// Sheet rows already used as post content. Grows until reset.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub consumed_rows: Vec<serde_json::Value>,
}

impl Page {
    /// Name for lists and confirmations; falls back to the platform id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.page_id
        } else {
            &self.name
        }
    }

    /// A page takes part in "post all" only when both flags are set.
    pub fn is_posting_active(&self) -> bool {
        self.is_active && self.posting_schedule.is_enabled()
    }

    /// Copy without the access token, as returned to clients.
    pub fn redacted(&self) -> Self {
        Self {
            access_token: None,
            ..self.clone()
        }
    }
}

/// Posting cadence embedded in a [`Page`].
///
/// At most one of cron / times / interval is meaningful; see [`PostingSchedule::kind`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostingSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u32>,
    #[serde(
        default,
        deserialize_with = "list_or_csv",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub times: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_posted_at: Option<DateTime<Utc>>,
}

impl PostingSchedule {
    /// Missing `enabled` counts as disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// The active schedule kind. Precedence: cron > times > interval.
    pub fn kind(&self) -> Option<ScheduleKind> {
        let timezone = self.timezone.clone().unwrap_or_else(|| "UTC".to_string());

        if let Some(expr) = self.cron_expression.as_deref().map(str::trim) {
            if !expr.is_empty() {
                return Some(ScheduleKind::Cron {
                    expression: expr.to_string(),
                    timezone,
                });
            }
        }
        if !self.times.is_empty() {
            return Some(ScheduleKind::Times {
                times: self.times.clone(),
                timezone,
            });
        }
        match self.interval_hours {
            Some(hours) if hours > 0 => Some(ScheduleKind::Interval { hours }),
            _ => None,
        }
    }

    /// Human-readable cadence, e.g. `Every 3 hour(s)`.
    pub fn describe(&self) -> String {
        self.kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "Not scheduled".to_string())
    }
}

/// Resolved schedule variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleKind {
    Cron { expression: String, timezone: String },
    Times { times: Vec<String>, timezone: String },
    Interval { hours: u32 },
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cron { expression, .. } => write!(f, "Cron: {}", expression),
            Self::Times { times, .. } => write!(f, "Times: {}", times.join(", ")),
            Self::Interval { hours } => write!(f, "Every {} hour(s)", hours),
        }
    }
}

/// Result of any `/pages/bulk-*` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    #[serde(default)]
    pub modified_count: u64,
}

// ============================================================================
// Prompts
// ============================================================================

/// Kind of post a prompt generates. Selects which type-specific fields apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PromptType {
    #[default]
    General,
    CelebrityComparison,
    NewsCollage,
}

impl PromptType {
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::CelebrityComparison => "Celebrity",
            Self::NewsCollage => "News Collage",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Openai,
    Gemini,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    #[default]
    Real,
    Ai,
}

impl ImageSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Ai => "AI",
        }
    }
}

/// Content-generation template as stored by the backend.
///
/// Type-specific fields are optional here; outgoing payloads are built from
/// [`crate::prompt_form::PromptDraft`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub prompt_type: PromptType,
    #[serde(default)]
    pub prompt_text: String,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub ai_provider: AiProvider,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub image_source: ImageSource,
    #[serde(default)]
    pub is_active: bool,
    #[serde(
        default,
        deserialize_with = "list_or_csv",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub metrics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_overlay_config: Option<StatsOverlayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// Styling of the comparison table drawn over celebrity images. Cosmetic only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsOverlayConfig {
    pub table_bg_color: String,
    pub table_border_color: String,
    pub header_bg_color: String,
    pub row_bg_color1: String,
    pub row_bg_color2: String,
    pub name_color: String,
    pub metric_color: String,
    pub value_color: String,
    pub vs_color: String,
    pub font_family: String,
    pub name_font_size: u32,
    pub metric_font_size: u32,
    pub value_font_size: u32,
    pub vs_font_size: u32,
    pub table_margin: u32,
    pub row_height: u32,
    pub header_height: u32,
    pub border_width: u32,
}

impl Default for StatsOverlayConfig {
    fn default() -> Self {
        Self {
            table_bg_color: "rgba(0, 0, 0, 0.88)".to_string(),
            table_border_color: "#FFD700".to_string(),
            header_bg_color: "rgba(139, 69, 19, 0.9)".to_string(),
            row_bg_color1: "rgba(139, 69, 19, 0.75)".to_string(),
            row_bg_color2: "rgba(101, 67, 33, 0.75)".to_string(),
            name_color: "#FFD700".to_string(),
            metric_color: "#FFD700".to_string(),
            value_color: "#FFFFFF".to_string(),
            vs_color: "#FFFFFF".to_string(),
            font_family: "Arial, sans-serif".to_string(),
            name_font_size: 20,
            metric_font_size: 15,
            value_font_size: 17,
            vs_font_size: 18,
            table_margin: 30,
            row_height: 50,
            header_height: 60,
            border_width: 3,
        }
    }
}

/// Collage settings for `news_collage` prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    pub collage_count: u32,
    pub layout: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            collage_count: 4,
            layout: "grid".to_string(),
        }
    }
}

// ============================================================================
// Logs & automation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Immutable audit record written by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    #[serde(default)]
    pub total_logs: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatus {
    #[serde(default)]
    pub active_pages_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<DateTime<Utc>>,
}

/// Body of `POST /automation/trigger`. No page id means every active page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
}

/// Pages a trigger was accepted for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerReceipt {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub page_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTrigger {
    Manual,
    ManualPost,
    Scheduled,
}

impl ExecutionTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ManualPost => "manual_post",
            Self::Scheduled => "scheduled",
        }
    }
}

/// One run of the posting pipeline for one page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub page_id: String,
    pub trigger: ExecutionTrigger,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// Drive & manual posts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
}

/// Operator-supplied comparison post: two names and two image URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManualPost {
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub celebrity_a: String,
    #[serde(default)]
    pub url_a: String,
    #[serde(default)]
    pub celebrity_b: String,
    #[serde(default)]
    pub url_b: String,
}

// ============================================================================
// Serde helpers
// ============================================================================

/// Split a comma-joined form value into trimmed, non-empty items.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts a list, a comma-joined string, or `null`.
fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<ListOrCsv>::deserialize(deserializer)? {
        Some(ListOrCsv::List(items)) => items,
        Some(ListOrCsv::Csv(joined)) => split_csv(&joined),
        None => Vec::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
