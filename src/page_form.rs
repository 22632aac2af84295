//! Page edit form and its wire payload.
//!
//! The form keeps every schedule field around so switching the schedule
//! type does not lose input; [`PageForm::to_input`] sends only the fields of
//! the selected type. Credentials are sent on create only.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::schema::{Page, PostingSchedule};

pub const DEFAULT_INTERVAL_HOURS: u32 = 2;
pub const DEFAULT_TIME: &str = "09:00";
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    #[default]
    Interval,
    Times,
    Cron,
}

impl ScheduleType {
    /// Which kind a stored schedule is edited as. Cron wins over times,
    /// times over interval; an empty schedule edits as interval.
    pub fn resolve(schedule: &PostingSchedule) -> Self {
        let has_cron = schedule
            .cron_expression
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if has_cron {
            Self::Cron
        } else if !schedule.times.is_empty() {
            Self::Times
        } else {
            Self::Interval
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Write payload for `POST /pages` and `PUT /pages/{pageId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub schedule_type: ScheduleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_true")]
    pub schedule_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheet_range: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PageInput {
    /// Rebuild a stored schedule from this payload, keeping `lastPostedAt`.
    pub fn posting_schedule(&self, previous: Option<&PostingSchedule>) -> PostingSchedule {
        let timezone = || {
            Some(
                self.timezone
                    .clone()
                    .filter(|tz| !tz.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            )
        };

        let mut schedule = PostingSchedule {
            enabled: Some(self.schedule_enabled),
            last_posted_at: previous.and_then(|p| p.last_posted_at),
            ..Default::default()
        };

        match self.schedule_type {
            ScheduleType::Interval => {
                schedule.interval_hours =
                    Some(self.interval_hours.unwrap_or(DEFAULT_INTERVAL_HOURS));
            }
            ScheduleType::Times => {
                schedule.times = self.times.clone().unwrap_or_default();
                schedule.timezone = timezone();
            }
            ScheduleType::Cron => {
                schedule.cron_expression = self.cron_expression.clone();
                schedule.timezone = timezone();
            }
        }
        schedule
    }

    /// `promptId` with empty strings treated as "unassigned".
    pub fn prompt_ref(&self) -> Option<String> {
        self.prompt_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Local state of the add/edit page form.
#[derive(Debug, Clone, PartialEq)]
pub struct PageForm {
    pub page_id: String,
    pub access_token: String,
    pub name: String,
    pub prompt_id: String,
    pub schedule_type: ScheduleType,
    pub interval_hours: u32,
    pub cron_expression: String,
    pub times: Vec<String>,
    pub timezone: String,
    pub schedule_enabled: bool,
    pub is_active: bool,
    pub drive_folder_id: Option<String>,
    pub drive_folder_name: Option<String>,
    pub google_sheet_id: Option<String>,
    pub google_sheet_range: Option<String>,
}

impl Default for PageForm {
    fn default() -> Self {
        Self {
            page_id: String::new(),
            access_token: String::new(),
            name: String::new(),
            prompt_id: String::new(),
            schedule_type: ScheduleType::Interval,
            interval_hours: DEFAULT_INTERVAL_HOURS,
            cron_expression: String::new(),
            times: vec![DEFAULT_TIME.to_string()],
            timezone: DEFAULT_TIMEZONE.to_string(),
            schedule_enabled: true,
            is_active: true,
            drive_folder_id: None,
            drive_folder_name: None,
            google_sheet_id: None,
            google_sheet_range: None,
        }
    }
}

impl PageForm {
    /// Prefill for editing. The access token is never echoed back.
    pub fn from_page(page: &Page) -> Self {
        let schedule = &page.posting_schedule;
        let defaults = Self::default();

        Self {
            page_id: page.page_id.clone(),
            access_token: String::new(),
            name: page.name.clone(),
            prompt_id: page.prompt_id.clone().unwrap_or_default(),
            schedule_type: ScheduleType::resolve(schedule),
            interval_hours: schedule
                .interval_hours
                .filter(|h| *h > 0)
                .unwrap_or(defaults.interval_hours),
            cron_expression: schedule.cron_expression.clone().unwrap_or_default(),
            times: if schedule.times.is_empty() {
                defaults.times
            } else {
                schedule.times.clone()
            },
            timezone: schedule.timezone.clone().unwrap_or(defaults.timezone),
            schedule_enabled: schedule.enabled.unwrap_or(true),
            is_active: page.is_active,
            drive_folder_id: page.drive_folder_id.clone(),
            drive_folder_name: page.drive_folder_name.clone(),
            google_sheet_id: page.google_sheet_id.clone(),
            google_sheet_range: page.google_sheet_range.clone(),
        }
    }

    /// Field constraints checked before any request is sent.
    pub fn validate(&self, mode: FormMode) -> ApiResult<()> {
        if mode == FormMode::Create {
            if self.page_id.trim().is_empty() {
                return Err(ApiError::validation("Page ID is required"));
            }
            if self.access_token.trim().is_empty() {
                return Err(ApiError::validation("Access token is required"));
            }
        }

        match self.schedule_type {
            ScheduleType::Interval => {
                if self.interval_hours < 1 {
                    return Err(ApiError::validation(
                        "Posting interval must be at least 1 hour",
                    ));
                }
            }
            ScheduleType::Times => {
                if self.times.is_empty() {
                    return Err(ApiError::validation("At least one posting time is required"));
                }
                if let Some(bad) = self.times.iter().find(|t| !is_valid_time(t)) {
                    return Err(ApiError::validation(format!(
                        "Invalid posting time {:?}: expected HH:MM",
                        bad
                    )));
                }
            }
            ScheduleType::Cron => {
                let expr = self.cron_expression.trim();
                if expr.is_empty() {
                    return Err(ApiError::validation("Cron expression is required"));
                }
                if expr.split_whitespace().count() != 5 {
                    return Err(ApiError::validation(
                        "Cron expression must have 5 fields: minute hour day month weekday",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Validate and build the payload for the given mode.
    pub fn to_input(&self, mode: FormMode) -> ApiResult<PageInput> {
        self.validate(mode)?;

        let (page_id, access_token) = match mode {
            FormMode::Create => (
                Some(self.page_id.trim().to_string()),
                Some(self.access_token.trim().to_string()),
            ),
            FormMode::Update => (None, None),
        };

        let timezone = Some(self.timezone.clone()).filter(|tz| !tz.trim().is_empty());
        let mut input = PageInput {
            page_id,
            access_token,
            name: self.name.trim().to_string(),
            prompt_id: Some(self.prompt_id.trim().to_string()).filter(|id| !id.is_empty()),
            schedule_type: self.schedule_type,
            schedule_enabled: self.schedule_enabled,
            is_active: self.is_active,
            drive_folder_id: self.drive_folder_id.clone(),
            drive_folder_name: self.drive_folder_name.clone(),
            google_sheet_id: self.google_sheet_id.clone(),
            google_sheet_range: self.google_sheet_range.clone(),
            ..Default::default()
        };

        match self.schedule_type {
            ScheduleType::Interval => input.interval_hours = Some(self.interval_hours),
            ScheduleType::Times => {
                input.times = Some(self.times.clone());
                input.timezone = timezone;
            }
            ScheduleType::Cron => {
                input.cron_expression = Some(self.cron_expression.trim().to_string());
                input.timezone = timezone;
            }
        }
        Ok(input)
    }
}

fn is_valid_time(value: &str) -> bool {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("static time pattern"))
        .is_match(value)
}
