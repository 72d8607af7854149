use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ModuleId;
use crate::model::module::Module;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    #[serde(alias = "mastered")]
    Completed,
}

impl ProgressStatus {
    /// Status implied by lesson counts.
    ///
    /// `completed` only when every lesson of a non-empty module is done.
    #[must_use]
    pub fn from_counts(completed_lessons: u32, total_lessons: u32) -> Self {
        if completed_lessons == 0 {
            ProgressStatus::NotStarted
        } else if total_lessons > 0 && completed_lessons >= total_lessons {
            ProgressStatus::Completed
        } else {
            ProgressStatus::InProgress
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

//
// ─── RAW FEED ──────────────────────────────────────────────────────────────────
//

/// One entry of the sparse per-user progress feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgressRecord {
    pub module_id: ModuleId,
    #[serde(default)]
    pub module_title: String,
    #[serde(default)]
    pub total_lessons: u32,
    #[serde(default)]
    pub completed_lessons: u32,
    /// 0-100 when the feed supplies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProgressStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

impl ModuleProgressRecord {
    #[must_use]
    pub fn new(module_id: ModuleId, total_lessons: u32, completed_lessons: u32) -> Self {
        Self {
            module_id,
            module_title: String::new(),
            total_lessons,
            completed_lessons,
            progress_percentage: None,
            status: None,
            last_accessed: None,
        }
    }

    #[must_use]
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.progress_percentage = Some(percentage);
        self
    }

    #[must_use]
    pub fn with_last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = Some(at);
        self
    }
}

/// Response of the progress summary endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub completed_modules: u32,
    #[serde(default)]
    pub total_lessons: u32,
    #[serde(default)]
    pub completed_lessons: u32,
    #[serde(default)]
    pub total_exercises: u32,
    #[serde(default)]
    pub completed_exercises: u32,
    #[serde(default)]
    pub overall_progress_percentage: f64,
    #[serde(default)]
    pub module_progress: Vec<ModuleProgressRecord>,
}

//
// ─── DERIVED VIEW ──────────────────────────────────────────────────────────────
//

/// Fully populated progress for one module.
///
/// Construction clamps `completed_lessons` to `total_lessons` and derives the
/// status from the counts, so the status rule always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    module_id: ModuleId,
    total_lessons: u32,
    completed_lessons: u32,
    progress_percentage: u8,
    status: ProgressStatus,
    last_accessed: Option<DateTime<Utc>>,
    estimated_completion_time: u32,
}

impl ModuleProgress {
    #[must_use]
    pub fn new(
        module_id: ModuleId,
        total_lessons: u32,
        completed_lessons: u32,
        progress_percentage: u8,
        last_accessed: Option<DateTime<Utc>>,
        estimated_completion_time: u32,
    ) -> Self {
        let completed_lessons = completed_lessons.min(total_lessons);
        Self {
            module_id,
            total_lessons,
            completed_lessons,
            progress_percentage: progress_percentage.min(100),
            status: ProgressStatus::from_counts(completed_lessons, total_lessons),
            last_accessed,
            estimated_completion_time,
        }
    }

    /// Zeroed view for a module the user has never touched.
    #[must_use]
    pub fn not_started(module: &Module) -> Self {
        Self::new(
            module.id,
            module.lesson_count,
            0,
            0,
            None,
            module.duration_minutes(),
        )
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn total_lessons(&self) -> u32 {
        self.total_lessons
    }

    #[must_use]
    pub fn completed_lessons(&self) -> u32 {
        self.completed_lessons
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.progress_percentage
    }

    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    #[must_use]
    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    /// Remaining minutes.
    #[must_use]
    pub fn estimated_completion_time(&self) -> u32 {
        self.estimated_completion_time
    }
}

/// A catalog module joined with its derived progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleWithProgress {
    #[serde(flatten)]
    pub module: Module,
    pub progress: ModuleProgress,
}

impl ModuleWithProgress {
    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        self.progress.status()
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.module.order
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.module.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_counts() {
        assert_eq!(ProgressStatus::from_counts(0, 5), ProgressStatus::NotStarted);
        assert_eq!(ProgressStatus::from_counts(0, 0), ProgressStatus::NotStarted);
        assert_eq!(ProgressStatus::from_counts(3, 5), ProgressStatus::InProgress);
        assert_eq!(ProgressStatus::from_counts(5, 5), ProgressStatus::Completed);
    }

    #[test]
    fn construction_clamps_completed_to_total() {
        let progress = ModuleProgress::new(ModuleId::generate(), 4, 9, 130, None, 0);
        assert_eq!(progress.completed_lessons(), 4);
        assert_eq!(progress.progress_percentage(), 100);
        assert_eq!(progress.status(), ProgressStatus::Completed);
    }

    #[test]
    fn not_started_uses_catalog_totals() {
        let module = Module::new(ModuleId::generate(), "Clauses", 3, 6).with_estimated_duration(90);
        let progress = ModuleProgress::not_started(&module);
        assert_eq!(progress.total_lessons(), 6);
        assert_eq!(progress.completed_lessons(), 0);
        assert_eq!(progress.status(), ProgressStatus::NotStarted);
        assert_eq!(progress.estimated_completion_time(), 90);
    }

    #[test]
    fn mastered_reads_as_completed() {
        let status: ProgressStatus = serde_json::from_str("\"mastered\"").unwrap();
        assert_eq!(status, ProgressStatus::Completed);
    }
}
