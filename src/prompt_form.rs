//! Prompt edit form and its type-shaped payload.
//!
//! The form holds every field for every prompt type so switching types in
//! the editor keeps input around. Submission goes through [`PromptDraft`],
//! whose [`PromptVariant`] only carries the fields of the selected type.

use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::schema::{
    split_csv, AiProvider, ImageConfig, ImageSource, Language, Prompt, PromptType,
    StatsOverlayConfig,
};

pub const DEFAULT_METRICS: &str = "age,height,famous_for,net_worth,spouse";

/// Type-specific part of a prompt payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptVariant {
    General {},
    #[serde(rename_all = "camelCase")]
    CelebrityComparison {
        metrics: Vec<String>,
        stats_overlay_config: StatsOverlayConfig,
    },
    #[serde(rename_all = "camelCase")]
    NewsCollage { image_config: ImageConfig },
}

impl PromptVariant {
    #[cfg(test)]
    pub fn prompt_type(&self) -> PromptType {
        match self {
            Self::General {} => PromptType::General,
            Self::CelebrityComparison { .. } => PromptType::CelebrityComparison,
            Self::NewsCollage { .. } => PromptType::NewsCollage,
        }
    }
}

/// Body of `POST /prompts` and `PUT /prompts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraft {
    pub name: String,
    pub prompt_text: String,
    pub hashtags: Vec<String>,
    pub ai_provider: AiProvider,
    pub language: Language,
    pub image_source: ImageSource,
    pub is_active: bool,
    #[serde(flatten)]
    pub variant: PromptVariant,
}

/// Local state of the add/edit prompt form. List fields are comma-joined.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptForm {
    pub name: String,
    pub prompt_type: PromptType,
    pub prompt_text: String,
    pub hashtags: String,
    pub ai_provider: AiProvider,
    pub language: Language,
    pub image_source: ImageSource,
    pub metrics: String,
    pub collage_count: u32,
    pub layout: String,
    pub is_active: bool,
    pub stats_overlay_config: StatsOverlayConfig,
}

impl Default for PromptForm {
    fn default() -> Self {
        let image = ImageConfig::default();
        Self {
            name: String::new(),
            prompt_type: PromptType::General,
            prompt_text: String::new(),
            hashtags: String::new(),
            ai_provider: AiProvider::default(),
            language: Language::default(),
            image_source: ImageSource::default(),
            metrics: DEFAULT_METRICS.to_string(),
            collage_count: image.collage_count,
            layout: image.layout,
            is_active: true,
            stats_overlay_config: StatsOverlayConfig::default(),
        }
    }
}

impl PromptForm {
    /// Prefill for editing; missing type-specific fields take form defaults.
    pub fn from_prompt(prompt: &Prompt) -> Self {
        let defaults = Self::default();
        let image = prompt.image_config.clone().unwrap_or_default();

        Self {
            name: prompt.name.clone(),
            prompt_type: prompt.prompt_type,
            prompt_text: prompt.prompt_text.clone(),
            hashtags: prompt.hashtags.join(", "),
            ai_provider: prompt.ai_provider,
            language: prompt.language,
            image_source: prompt.image_source,
            metrics: if prompt.metrics.is_empty() {
                defaults.metrics
            } else {
                prompt.metrics.join(",")
            },
            collage_count: if image.collage_count == 0 {
                defaults.collage_count
            } else {
                image.collage_count
            },
            layout: if image.layout.is_empty() {
                defaults.layout
            } else {
                image.layout
            },
            is_active: prompt.is_active,
            stats_overlay_config: prompt
                .stats_overlay_config
                .clone()
                .unwrap_or(defaults.stats_overlay_config),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Name is required"));
        }
        if self.prompt_text.trim().is_empty() {
            return Err(ApiError::validation("Prompt text is required"));
        }
        match self.prompt_type {
            PromptType::CelebrityComparison if split_csv(&self.metrics).is_empty() => {
                Err(ApiError::validation("At least one metric is required"))
            }
            PromptType::NewsCollage if self.collage_count < 1 => {
                Err(ApiError::validation("Collage needs at least one image"))
            }
            _ => Ok(()),
        }
    }

    /// Apply one `key=value` override to the comparison overlay. Keys use the
    /// wire names (`nameColor`, `rowHeight`, ...); size fields take integers.
    pub fn set_overlay(&mut self, assignment: &str) -> ApiResult<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ApiError::validation(format!("Overlay setting must be key=value: {}", assignment))
        })?;
        let (key, value) = (key.trim(), value.trim());
        if value.is_empty() {
            return Err(ApiError::validation(format!("Overlay {} needs a value", key)));
        }

        let mut config = serde_json::to_value(&self.stats_overlay_config)?;
        let slot = config
            .get_mut(key)
            .ok_or_else(|| ApiError::validation(format!("Unknown overlay setting: {}", key)))?;
        let numeric = slot.is_number();
        *slot = if numeric {
            let n: u32 = value.parse().map_err(|_| {
                ApiError::validation(format!("Overlay {} must be a whole number: {}", key, value))
            })?;
            n.into()
        } else {
            value.into()
        };

        self.stats_overlay_config = serde_json::from_value(config)?;
        Ok(())
    }

    /// Validate and shape the payload for the selected type.
    pub fn to_draft(&self) -> ApiResult<PromptDraft> {
        self.validate()?;

        let variant = match self.prompt_type {
            PromptType::General => PromptVariant::General {},
            PromptType::CelebrityComparison => PromptVariant::CelebrityComparison {
                metrics: split_csv(&self.metrics),
                stats_overlay_config: self.stats_overlay_config.clone(),
            },
            PromptType::NewsCollage => PromptVariant::NewsCollage {
                image_config: ImageConfig {
                    collage_count: self.collage_count,
                    layout: self.layout.trim().to_string(),
                },
            },
        };

        Ok(PromptDraft {
            name: self.name.trim().to_string(),
            prompt_text: self.prompt_text.trim().to_string(),
            hashtags: split_csv(&self.hashtags),
            ai_provider: self.ai_provider,
            language: self.language,
            image_source: self.image_source,
            is_active: self.is_active,
            variant,
        })
    }
}
