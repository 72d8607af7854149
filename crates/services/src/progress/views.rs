use std::cmp::Ordering;

use grammar_core::model::{
    ModuleWithProgress, ProgressStatus, SortDirection, SortKey, StatusFilter,
};
use serde::Serialize;

//
// ─── SORT & FILTER ─────────────────────────────────────────────────────────────
//

fn compare(a: &ModuleWithProgress, b: &ModuleWithProgress, key: SortKey) -> Ordering {
    match key {
        SortKey::Order => a.order().cmp(&b.order()),
        SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
        SortKey::Progress => a
            .progress
            .progress_percentage()
            .cmp(&b.progress.progress_percentage()),
        // `None < Some`, so unaccessed modules count as the oldest.
        SortKey::LastAccessed => a.progress.last_accessed().cmp(&b.progress.last_accessed()),
    }
}

/// Stable sort; ties keep their input order in both directions.
#[must_use]
pub fn sort(
    list: &[ModuleWithProgress],
    key: SortKey,
    direction: SortDirection,
) -> Vec<ModuleWithProgress> {
    let mut sorted = list.to_vec();
    sorted.sort_by(|a, b| match direction {
        SortDirection::Asc => compare(a, b, key),
        SortDirection::Desc => compare(b, a, key),
    });
    sorted
}

fn matches_search(entry: &ModuleWithProgress, needle: &str) -> bool {
    entry.title().to_lowercase().contains(needle)
        || entry
            .module
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Case-insensitive title/description search AND status filter.
#[must_use]
pub fn filter(
    list: &[ModuleWithProgress],
    search: &str,
    status: StatusFilter,
) -> Vec<ModuleWithProgress> {
    let needle = search.trim().to_lowercase();
    list.iter()
        .filter(|entry| needle.is_empty() || matches_search(entry, &needle))
        .filter(|entry| status.matches(entry.status()))
        .cloned()
        .collect()
}

/// Everything the module list page lets the user choose.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilters {
    pub search: String,
    pub status: StatusFilter,
    pub sort_by: SortKey,
    pub sort_direction: SortDirection,
}

impl ModuleFilters {
    #[must_use]
    pub fn apply(&self, list: &[ModuleWithProgress]) -> Vec<ModuleWithProgress> {
        let filtered = filter(list, &self.search, self.status);
        sort(&filtered, self.sort_by, self.sort_direction)
    }
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    pub total_modules: usize,
    pub completed_modules: usize,
    pub in_progress_modules: usize,
    pub not_started_modules: usize,
    /// Rounded mean of the module percentages.
    pub overall_progress: u8,
}

#[must_use]
pub fn overall_stats(list: &[ModuleWithProgress]) -> OverallStats {
    let count = |status: ProgressStatus| list.iter().filter(|m| m.status() == status).count();
    let overall_progress = if list.is_empty() {
        0
    } else {
        let sum: u64 = list
            .iter()
            .map(|m| u64::from(m.progress.progress_percentage()))
            .sum();
        let len = u64::try_from(list.len()).unwrap_or(u64::MAX);
        u8::try_from((2 * sum + len) / (2 * len)).unwrap_or(100)
    };
    OverallStats {
        total_modules: list.len(),
        completed_modules: count(ProgressStatus::Completed),
        in_progress_modules: count(ProgressStatus::InProgress),
        not_started_modules: count(ProgressStatus::NotStarted),
        overall_progress,
    }
}

/// Simplified streak: modules the user has started or finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearningStreak {
    pub current: usize,
    pub longest: usize,
}

#[must_use]
pub fn learning_streak(list: &[ModuleWithProgress]) -> LearningStreak {
    let touched = list
        .iter()
        .filter(|m| m.status() != ProgressStatus::NotStarted)
        .count();
    LearningStreak {
        current: touched,
        longest: touched,
    }
}

//
// ─── GATING ────────────────────────────────────────────────────────────────────
//

/// The first module is always open; any other opens once its predecessor
/// has been started.
#[must_use]
pub fn is_available(module: &ModuleWithProgress, all: &[ModuleWithProgress]) -> bool {
    let order = module.order();
    if order <= 1 {
        return true;
    }
    all.iter()
        .find(|m| m.order() == order - 1)
        .is_none_or(|previous| previous.status() != ProgressStatus::NotStarted)
}

/// First in-progress module, else first not started one, in catalog order.
#[must_use]
pub fn next_recommended(list: &[ModuleWithProgress]) -> Option<&ModuleWithProgress> {
    let first_with = |status: ProgressStatus| {
        list.iter()
            .filter(|m| m.status() == status)
            .min_by_key(|m| m.order())
    };
    first_with(ProgressStatus::InProgress).or_else(|| first_with(ProgressStatus::NotStarted))
}
