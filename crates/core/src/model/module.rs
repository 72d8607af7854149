use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::ids::ModuleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

// The catalog sends `"lesson_count": null` for modules without lessons.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Option::<u32>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A catalog module as served by the module catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    /// 1-based catalog position.
    pub order: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub lesson_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<Difficulty>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, title: impl Into<String>, order: u32, lesson_count: u32) -> Self {
        Self {
            id,
            title: title.into(),
            order,
            lesson_count,
            created_at: None,
            description: None,
            difficulty_level: None,
            estimated_duration: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_estimated_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty_level = Some(difficulty);
        self
    }

    /// Estimated duration in minutes, zero when the catalog gives none.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.estimated_duration.unwrap_or(0)
    }

    #[must_use]
    pub fn subtitle(&self) -> String {
        format!("Module {}", self.order)
    }

    #[must_use]
    pub fn lesson_count_label(&self) -> String {
        if self.lesson_count == 1 {
            "1 lesson".to_string()
        } else {
            format!("{} lessons", self.lesson_count)
        }
    }

    /// Rounded-up hours, or "Duration varies" without an estimate.
    #[must_use]
    pub fn duration_label(&self) -> String {
        match self.estimated_duration {
            Some(minutes) if minutes > 0 => format!("{} hours", minutes.div_ceil(60)),
            _ => "Duration varies".to_string(),
        }
    }

    #[must_use]
    pub fn display_description(&self) -> String {
        match self.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => format!(
                "Learn grammar concepts through {}",
                self.lesson_count_label()
            ),
        }
    }
}
