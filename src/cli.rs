//! Command-line shell: maps subcommands onto views.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::info;

use crate::api::LogFilter;
use crate::client::ApiClient;
use crate::config::AdminConfig;
use crate::error::ApiResult;
use crate::interact::{Console, Interaction};
use crate::page_form::{FormMode, PageForm, ScheduleType};
use crate::prompt_form::PromptForm;
use crate::schema::{AiProvider, DriveFolder, ImageSource, Language, LogLevel, PromptType};
use crate::server;
use crate::views::dashboard::{self, DashboardView};
use crate::views::logs::{self, LogsView};
use crate::views::pages::PagesView;
use crate::views::prompts::PromptsView;
use crate::views::{local_time, Outcome, Table};

#[derive(Parser)]
#[command(author, version, about = "Admin console for the social-media autoposter")]
pub struct Cli {
    /// Base URL of the admin API
    #[arg(long, global = true, env = "AUTOPOST_API_URL")]
    pub api_url: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the in-memory reference backend
    Serve,
    /// Automation status and log summary
    Dashboard {
        /// Keep refreshing until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Post now: every active page, or one page
    Trigger {
        #[arg(long)]
        page_id: Option<String>,
    },
    /// Manage pages
    Pages {
        #[command(subcommand)]
        action: PagesCommand,
    },
    /// Manage prompts
    Prompts {
        #[command(subcommand)]
        action: PromptsCommand,
    },
    /// Show the audit log
    Logs {
        #[arg(long = "type")]
        log_type: Option<String>,
        #[arg(long, value_enum)]
        level: Option<LogLevel>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        /// Keep refreshing until Ctrl-C
        #[arg(long)]
        follow: bool,
    },
    /// Recent pipeline executions
    Executions {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Drive folders available as content sources
    Folders,
}

#[derive(Subcommand)]
pub enum PagesCommand {
    List,
    Add {
        page_id: String,
        #[arg(long)]
        access_token: String,
        #[command(flatten)]
        fields: PageFields,
    },
    Edit {
        page_id: String,
        #[command(flatten)]
        fields: PageFields,
    },
    Delete {
        page_id: String,
    },
    /// Make a page's used sheet rows available again
    ResetRows {
        page_id: String,
    },
    ResetAllRows,
    /// Enable all schedules, or disable all when every one is enabled
    ToggleSchedules,
    /// Forget when each page last posted
    ClearTimings,
    PostAll,
    Post {
        page_id: String,
    },
    /// Post a celebrity comparison with operator-supplied images
    ManualPost {
        page_id: String,
        #[arg(long)]
        celebrity_a: String,
        #[arg(long)]
        url_a: String,
        #[arg(long)]
        celebrity_b: String,
        #[arg(long)]
        url_b: String,
    },
}

/// Page form fields. Unset flags keep the current (or default) value.
#[derive(Args, Default)]
pub struct PageFields {
    #[arg(long)]
    name: Option<String>,
    /// Prompt id; pass an empty string to unassign
    #[arg(long)]
    prompt_id: Option<String>,
    /// Schedule type; inferred from the schedule flags when omitted
    #[arg(long, value_enum)]
    schedule: Option<ScheduleType>,
    #[arg(long)]
    interval_hours: Option<u32>,
    /// Posting time (HH:MM), repeatable or comma-separated
    #[arg(long = "time", value_delimiter = ',')]
    times: Vec<String>,
    #[arg(long)]
    cron: Option<String>,
    #[arg(long)]
    timezone: Option<String>,
    #[arg(long)]
    schedule_enabled: Option<bool>,
    #[arg(long)]
    active: Option<bool>,
    #[arg(long)]
    drive_folder_id: Option<String>,
    #[arg(long)]
    sheet_id: Option<String>,
    #[arg(long)]
    sheet_range: Option<String>,
}

impl PageFields {
    fn apply(&self, form: &mut PageForm, folders: &[DriveFolder]) {
        if let Some(name) = &self.name {
            form.name = name.clone();
        }
        if let Some(prompt_id) = &self.prompt_id {
            form.prompt_id = prompt_id.clone();
        }
        if let Some(hours) = self.interval_hours {
            form.interval_hours = hours;
        }
        if !self.times.is_empty() {
            form.times = self.times.clone();
        }
        if let Some(cron) = &self.cron {
            form.cron_expression = cron.clone();
        }
        if let Some(tz) = &self.timezone {
            form.timezone = tz.clone();
        }

        let inferred = if self.cron.is_some() {
            Some(ScheduleType::Cron)
        } else if !self.times.is_empty() {
            Some(ScheduleType::Times)
        } else if self.interval_hours.is_some() {
            Some(ScheduleType::Interval)
        } else {
            None
        };
        if let Some(kind) = self.schedule.or(inferred) {
            form.schedule_type = kind;
        }

        if let Some(enabled) = self.schedule_enabled {
            form.schedule_enabled = enabled;
        }
        if let Some(active) = self.active {
            form.is_active = active;
        }
        if let Some(id) = &self.drive_folder_id {
            form.drive_folder_name = folders
                .iter()
                .find(|f| &f.id == id)
                .map(|f| f.name.clone());
            form.drive_folder_id = Some(id.clone());
        }
        if let Some(sheet) = &self.sheet_id {
            form.google_sheet_id = Some(sheet.clone());
        }
        if let Some(range) = &self.sheet_range {
            form.google_sheet_range = Some(range.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum PromptsCommand {
    List,
    Add {
        #[command(flatten)]
        fields: PromptFields,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: PromptFields,
    },
    Delete {
        id: String,
    },
}

/// Prompt form fields. Unset flags keep the current (or default) value.
#[derive(Args, Default)]
pub struct PromptFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "type", value_enum)]
    prompt_type: Option<PromptType>,
    #[arg(long)]
    text: Option<String>,
    /// Comma-separated hashtags
    #[arg(long)]
    hashtags: Option<String>,
    #[arg(long, value_enum)]
    ai_provider: Option<AiProvider>,
    #[arg(long, value_enum)]
    language: Option<Language>,
    #[arg(long, value_enum)]
    image_source: Option<ImageSource>,
    /// Comma-separated comparison metrics
    #[arg(long)]
    metrics: Option<String>,
    #[arg(long)]
    collage_count: Option<u32>,
    #[arg(long)]
    layout: Option<String>,
    #[arg(long)]
    active: Option<bool>,
    /// Comparison overlay style as KEY=VALUE (e.g. nameColor=#FF0000), repeatable
    #[arg(long = "overlay", value_name = "KEY=VALUE")]
    overlay: Vec<String>,
}

impl PromptFields {
    fn apply(&self, form: &mut PromptForm) -> ApiResult<()> {
        if let Some(name) = &self.name {
            form.name = name.clone();
        }
        if let Some(kind) = self.prompt_type {
            form.prompt_type = kind;
        }
        if let Some(text) = &self.text {
            form.prompt_text = text.clone();
        }
        if let Some(hashtags) = &self.hashtags {
            form.hashtags = hashtags.clone();
        }
        if let Some(provider) = self.ai_provider {
            form.ai_provider = provider;
        }
        if let Some(language) = self.language {
            form.language = language;
        }
        if let Some(source) = self.image_source {
            form.image_source = source;
        }
        if let Some(metrics) = &self.metrics {
            form.metrics = metrics.clone();
        }
        if let Some(count) = self.collage_count {
            form.collage_count = count;
        }
        if let Some(layout) = &self.layout {
            form.layout = layout.clone();
        }
        if let Some(active) = self.active {
            form.is_active = active;
        }
        for assignment in &self.overlay {
            form.set_overlay(assignment)?;
        }
        Ok(())
    }
}

fn exit_code(outcome: Outcome) -> ExitCode {
    if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn connect(config: &AdminConfig, assume_yes: bool) -> Result<(ApiClient, Arc<dyn Interaction>)> {
    let client = ApiClient::new(&config.api_url)?;
    info!("Using admin API at {}", client.base_url());
    Ok((client, Arc::new(Console::new(assume_yes))))
}

pub async fn run(cli: Cli, config: AdminConfig) -> Result<ExitCode> {
    let config = match &cli.api_url {
        Some(url) => config.with_api_url(url),
        None => config,
    };

    let outcome = match cli.command {
        Command::Serve => {
            server::serve(&config).await?;
            Outcome::Completed
        }
        Command::Dashboard { watch } => {
            let (client, ui) = connect(&config, cli.yes)?;
            run_dashboard(client, ui, &config, watch).await?
        }
        Command::Trigger { page_id } => {
            let (client, ui) = connect(&config, cli.yes)?;
            run_trigger(client, ui, &config, page_id).await
        }
        Command::Pages { action } => {
            let (client, ui) = connect(&config, cli.yes)?;
            run_pages(client, ui, &config, action).await
        }
        Command::Prompts { action } => {
            let (client, ui) = connect(&config, cli.yes)?;
            run_prompts(client, ui, action).await
        }
        Command::Logs {
            log_type,
            level,
            limit,
            follow,
        } => {
            let filter = LogFilter {
                log_type: log_type.filter(|t| !t.trim().is_empty()),
                level,
                limit: Some(limit),
            };
            let (client, _) = connect(&config, cli.yes)?;
            run_logs(client, &config, filter, follow).await?
        }
        Command::Executions { limit } => {
            let (client, _) = connect(&config, cli.yes)?;
            run_executions(client, limit).await
        }
        Command::Folders => {
            let (client, _) = connect(&config, cli.yes)?;
            run_folders(client).await
        }
    };

    Ok(exit_code(outcome))
}

async fn run_dashboard(
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    config: &AdminConfig,
    watch: bool,
) -> Result<Outcome> {
    let view = Arc::new(Mutex::new(DashboardView::new(client, ui)));

    if watch {
        let handle = dashboard::watch(view, config.dashboard_refresh);
        tokio::signal::ctrl_c().await?;
        handle.cancel();
        return Ok(Outcome::Completed);
    }

    let mut view = view.lock().await;
    let outcome = view.load().await;
    println!("{}", view.render());
    Ok(outcome)
}

async fn run_trigger(
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    config: &AdminConfig,
    page_id: Option<String>,
) -> Outcome {
    if let Some(page_id) = page_id {
        return run_pages(client, ui, config, PagesCommand::Post { page_id }).await;
    }

    let view = Arc::new(Mutex::new(DashboardView::new(client, ui)));
    let outcome = {
        let mut view = view.lock().await;
        if view.load().await.is_failure() {
            eprintln!("Could not load dashboard data; nothing was triggered.");
            return Outcome::Failed;
        }
        view.trigger_all().await
    };

    if outcome == Outcome::Completed {
        println!(
            "Refreshing in {}s...",
            config.trigger_refresh.as_secs()
        );
        dashboard::refresh_after(view.clone(), config.trigger_refresh)
            .join()
            .await;
    }
    println!("{}", view.lock().await.render());
    outcome
}

async fn run_pages(
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    config: &AdminConfig,
    action: PagesCommand,
) -> Outcome {
    let mut view = PagesView::new(client, ui.clone());
    let loaded = view.load().await;
    if loaded.is_failure() {
        return loaded;
    }

    let outcome = match action {
        PagesCommand::List => {
            println!("{}", view.render());
            return Outcome::Completed;
        }
        PagesCommand::Add {
            page_id,
            access_token,
            fields,
        } => {
            let mut form = PageForm {
                page_id,
                access_token,
                ..Default::default()
            };
            fields.apply(&mut form, &view.drive_folders);
            view.save(&form, FormMode::Create).await
        }
        PagesCommand::Edit { page_id, fields } => {
            let Some(mut form) = view.edit_form(&page_id) else {
                ui.alert(&format!("Page not found: {}", page_id));
                return Outcome::Failed;
            };
            fields.apply(&mut form, &view.drive_folders);
            view.save(&form, FormMode::Update).await
        }
        PagesCommand::Delete { page_id } => view.delete(&page_id).await,
        PagesCommand::ResetRows { page_id } => view.reset_consumed_rows(&page_id).await,
        PagesCommand::ResetAllRows => view.reset_all_consumed_rows().await,
        PagesCommand::ToggleSchedules => view.toggle_all_schedules().await,
        PagesCommand::ClearTimings => view.clear_all_timings().await,
        PagesCommand::PostAll => {
            let outcome = view.post_all_active().await;
            settle(&mut view, config, outcome).await
        }
        PagesCommand::Post { page_id } => {
            let outcome = view.post_page(&page_id).await;
            settle(&mut view, config, outcome).await
        }
        PagesCommand::ManualPost {
            page_id,
            celebrity_a,
            url_a,
            celebrity_b,
            url_b,
        } => {
            let mut modal = view.manual_post(&page_id);
            modal.set_side_a(&celebrity_a, &url_a);
            modal.set_side_b(&celebrity_b, &url_b);
            return modal.submit().await;
        }
    };

    println!("{}", view.render());
    outcome
}

/// Give the pipeline a moment to record the post before re-listing.
async fn settle(view: &mut PagesView, config: &AdminConfig, outcome: Outcome) -> Outcome {
    if outcome == Outcome::Completed {
        tokio::time::sleep(config.trigger_refresh).await;
        view.load().await;
    }
    outcome
}

async fn run_prompts(
    client: ApiClient,
    ui: Arc<dyn Interaction>,
    action: PromptsCommand,
) -> Outcome {
    let mut view = PromptsView::new(client, ui.clone());
    let loaded = view.load().await;
    if loaded.is_failure() {
        return loaded;
    }

    let outcome = match action {
        PromptsCommand::List => Outcome::Completed,
        PromptsCommand::Add { fields } => {
            save_prompt(&mut view, ui.as_ref(), PromptForm::default(), &fields, None).await
        }
        PromptsCommand::Edit { id, fields } => {
            let Some(form) = view.edit_form(&id) else {
                ui.alert(&format!("Prompt not found: {}", id));
                return Outcome::Failed;
            };
            save_prompt(&mut view, ui.as_ref(), form, &fields, Some(&id)).await
        }
        PromptsCommand::Delete { id } => view.delete(&id).await,
    };

    println!("{}", view.render());
    outcome
}

async fn save_prompt(
    view: &mut PromptsView,
    ui: &dyn Interaction,
    mut form: PromptForm,
    fields: &PromptFields,
    id: Option<&str>,
) -> Outcome {
    if let Err(e) = fields.apply(&mut form) {
        ui.alert(&format!("Error saving prompt: {}", e));
        return Outcome::Failed;
    }
    view.save(&form, id).await
}

async fn run_logs(
    client: ApiClient,
    config: &AdminConfig,
    filter: LogFilter,
    follow: bool,
) -> Result<Outcome> {
    let view = Arc::new(Mutex::new(LogsView::new(client, filter)));

    if follow {
        let handle = logs::follow(view, config.logs_refresh);
        tokio::signal::ctrl_c().await?;
        handle.cancel();
        return Ok(Outcome::Completed);
    }

    let mut view = view.lock().await;
    let outcome = view.load().await;
    if outcome.is_failure() {
        eprintln!("Could not load logs; see the log output for details.");
    }
    println!("{}", view.render());
    Ok(outcome)
}

async fn run_executions(client: ApiClient, limit: u32) -> Outcome {
    match client.automation().executions(Some(limit)).await {
        Ok(executions) if executions.is_empty() => {
            println!("No executions yet");
            Outcome::Completed
        }
        Ok(executions) => {
            let mut table = Table::new(&["Created", "Page", "Trigger", "Status", "Message"]);
            for execution in executions {
                table.row(vec![
                    local_time(Some(execution.created_at)),
                    execution.page_id,
                    execution.trigger.as_str().to_string(),
                    execution.status,
                    execution.message.unwrap_or_default(),
                ]);
            }
            println!("{}", table.render());
            Outcome::Completed
        }
        Err(e) => {
            eprintln!("Error loading executions: {}", e);
            Outcome::Failed
        }
    }
}

async fn run_folders(client: ApiClient) -> Outcome {
    match client.drive().folders().await {
        Ok(folders) if folders.is_empty() => {
            println!("No drive folders configured");
            Outcome::Completed
        }
        Ok(folders) => {
            let mut table = Table::new(&["ID", "Name"]);
            for folder in folders {
                table.row(vec![folder.id, folder.name]);
            }
            println!("{}", table.render());
            Outcome::Completed
        }
        Err(e) => {
            eprintln!("Error loading drive folders: {}", e);
            Outcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::testing::Scripted;
    use crate::server::testing::spawn;
    use clap::CommandFactory;

    fn default_config() -> AdminConfig {
        AdminConfig::from_lookup(|_| None).unwrap()
    }

    #[tokio::test]
    async fn test_trigger_fails_when_backend_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        let ui = Arc::new(Scripted::answering(&[true]));

        let outcome = run_trigger(client, ui.clone(), &default_config(), None).await;
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(exit_code(outcome), ExitCode::FAILURE);
        assert!(ui.last_alert().is_none());
        assert!(ui.confirmations.lock().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_overlay_flags_are_saved() {
        let server = spawn().await;
        let cli = Cli::parse_from([
            "autopost-admin",
            "prompts",
            "add",
            "--name",
            "Legends",
            "--type",
            "celebrity-comparison",
            "--text",
            "Compare two legends",
            "--overlay",
            "nameColor=#FF0000",
            "--overlay",
            "rowHeight=64",
        ]);
        let Command::Prompts { action } = cli.command else {
            panic!("expected prompts");
        };

        let ui = Arc::new(Scripted::default());
        let outcome = run_prompts(server.client.clone(), ui, action).await;
        assert_eq!(outcome, Outcome::Completed);

        let stored = server.store.list_prompts();
        let overlay = stored[0].stats_overlay_config.as_ref().unwrap();
        assert_eq!(overlay.name_color, "#FF0000");
        assert_eq!(overlay.row_height, 64);
        assert_eq!(overlay.border_width, 3);
    }

    #[tokio::test]
    async fn test_bad_overlay_flag_sends_nothing() {
        let server = spawn().await;
        let cli = Cli::parse_from([
            "autopost-admin",
            "prompts",
            "add",
            "--name",
            "Legends",
            "--text",
            "Compare two legends",
            "--overlay",
            "glow=on",
        ]);
        let Command::Prompts { action } = cli.command else {
            panic!("expected prompts");
        };

        let ui = Arc::new(Scripted::default());
        let outcome = run_prompts(server.client.clone(), ui.clone(), action).await;
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(
            ui.last_alert().as_deref(),
            Some("Error saving prompt: Unknown overlay setting: glow")
        );
        assert!(server.store.list_prompts().is_empty());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_page_flags_infer_schedule_type() {
        let cli = Cli::parse_from([
            "autopost-admin",
            "pages",
            "add",
            "123",
            "--access-token",
            "tok",
            "--time",
            "09:00,18:30",
            "--timezone",
            "Asia/Kolkata",
            "--drive-folder-id",
            "f1",
        ]);
        let Command::Pages {
            action: PagesCommand::Add { fields, .. },
        } = cli.command
        else {
            panic!("expected pages add");
        };

        let mut form = PageForm::default();
        let folders = vec![DriveFolder {
            id: "f1".to_string(),
            name: "Cricket".to_string(),
        }];
        fields.apply(&mut form, &folders);
        assert_eq!(form.schedule_type, ScheduleType::Times);
        assert_eq!(form.times, vec!["09:00", "18:30"]);
        assert_eq!(form.timezone, "Asia/Kolkata");
        assert_eq!(form.drive_folder_name.as_deref(), Some("Cricket"));
    }

    #[test]
    fn test_edit_keeps_unset_fields() {
        let mut form = PageForm {
            name: "Fans".to_string(),
            schedule_type: ScheduleType::Cron,
            cron_expression: "0 9 * * *".to_string(),
            ..Default::default()
        };
        PageFields {
            active: Some(false),
            ..Default::default()
        }
        .apply(&mut form, &[]);
        assert_eq!(form.name, "Fans");
        assert_eq!(form.schedule_type, ScheduleType::Cron);
        assert!(!form.is_active);
    }

    #[test]
    fn test_prompt_flags() {
        let cli = Cli::parse_from([
            "autopost-admin",
            "--yes",
            "prompts",
            "add",
            "--name",
            "News",
            "--type",
            "news-collage",
            "--text",
            "Tech news",
            "--collage-count",
            "6",
        ]);
        assert!(cli.yes);
        let Command::Prompts {
            action: PromptsCommand::Add { fields },
        } = cli.command
        else {
            panic!("expected prompts add");
        };
        let mut form = PromptForm::default();
        fields.apply(&mut form).unwrap();
        assert_eq!(form.prompt_type, PromptType::NewsCollage);
        assert_eq!(form.collage_count, 6);
        assert!(form.to_draft().is_ok());
    }
}
