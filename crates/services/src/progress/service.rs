use std::fmt;
use std::sync::Arc;

use grammar_core::model::{ModuleQuery, ModuleWithProgress, ProgressSummary};
use serde::Serialize;
use storage::repository::{ModuleRepository, ProgressRepository};
use tracing::info;

use super::reconcile::reconcile;
use super::views::{
    LearningStreak, ModuleFilters, OverallStats, learning_streak, next_recommended, overall_stats,
};
use crate::error::ProgressServiceError;

/// Everything the dashboard renders, computed from one catalog and summary fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub modules: Vec<ModuleWithProgress>,
    pub stats: OverallStats,
    pub streak: LearningStreak,
    pub next_recommended: Option<ModuleWithProgress>,
    /// Server-side totals, passed through untouched.
    pub summary: ProgressSummary,
}

/// Reads the catalog and progress feed and derives the module views.
///
/// Nothing is cached: every call refetches both inputs and reconciles again.
#[derive(Clone)]
pub struct ProgressService {
    modules: Arc<dyn ModuleRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl fmt::Debug for ProgressService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressService").finish_non_exhaustive()
    }
}

impl ProgressService {
    #[must_use]
    pub fn new(modules: Arc<dyn ModuleRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { modules, progress }
    }

    async fn fetch(&self) -> Result<(Vec<ModuleWithProgress>, ProgressSummary), ProgressServiceError> {
        let query = ModuleQuery::default();
        let (page, summary) = tokio::try_join!(
            self.modules.list_modules(&query),
            self.progress.progress_summary()
        )?;
        let list = reconcile(&page.modules, &summary.module_progress);
        info!(
            modules = list.len(),
            records = summary.module_progress.len(),
            "progress reconciled"
        );
        Ok((list, summary))
    }

    /// Catalog joined with progress plus the dashboard aggregates.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if either fetch fails.
    pub async fn overview(&self) -> Result<ProgressOverview, ProgressServiceError> {
        let (modules, summary) = self.fetch().await?;
        let stats = overall_stats(&modules);
        let streak = learning_streak(&modules);
        let next_recommended = next_recommended(&modules).cloned();
        Ok(ProgressOverview {
            modules,
            stats,
            streak,
            next_recommended,
            summary,
        })
    }

    /// Filtered and sorted module list.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if either fetch fails.
    pub async fn modules_view(
        &self,
        filters: &ModuleFilters,
    ) -> Result<Vec<ModuleWithProgress>, ProgressServiceError> {
        let (modules, _) = self.fetch().await?;
        Ok(filters.apply(&modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_core::model::{
        Module, ModuleId, ModuleProgressRecord, ProgressStatus, SortDirection, SortKey,
        StatusFilter,
    };
    use storage::repository::InMemoryRepository;

    fn service_with(modules: Vec<Module>, records: Vec<ModuleProgressRecord>) -> ProgressService {
        let repo = InMemoryRepository::new();
        repo.set_modules(modules).unwrap();
        repo.set_summary(ProgressSummary {
            total_modules: 3,
            module_progress: records,
            ..ProgressSummary::default()
        })
        .unwrap();
        ProgressService::new(Arc::new(repo.clone()), Arc::new(repo))
    }

    #[tokio::test]
    async fn overview_covers_every_catalog_module() {
        let modules = vec![
            Module::new(ModuleId::generate(), "Nouns", 1, 4).with_estimated_duration(60),
            Module::new(ModuleId::generate(), "Verbs", 2, 4).with_estimated_duration(60),
            Module::new(ModuleId::generate(), "Adjectives", 3, 4).with_estimated_duration(60),
        ];
        let records = vec![
            ModuleProgressRecord::new(modules[0].id, 4, 4),
            ModuleProgressRecord::new(modules[1].id, 4, 2),
        ];
        let service = service_with(modules, records);

        let overview = service.overview().await.unwrap();
        assert_eq!(overview.modules.len(), 3);
        assert_eq!(overview.stats.completed_modules, 1);
        assert_eq!(overview.stats.in_progress_modules, 1);
        assert_eq!(overview.stats.overall_progress, 50);
        assert_eq!(overview.streak.current, 2);
        assert_eq!(
            overview.next_recommended.as_ref().map(ModuleWithProgress::title),
            Some("Verbs")
        );
        assert_eq!(overview.summary.total_modules, 3);
    }

    #[tokio::test]
    async fn modules_view_filters_then_sorts() {
        let modules = vec![
            Module::new(ModuleId::generate(), "Nouns", 1, 4),
            Module::new(ModuleId::generate(), "Pronouns", 2, 4),
            Module::new(ModuleId::generate(), "Verbs", 3, 4),
        ];
        let service = service_with(modules, Vec::new());

        let view = service
            .modules_view(&ModuleFilters {
                search: "noun".into(),
                status: StatusFilter::NotStarted,
                sort_by: SortKey::Title,
                sort_direction: SortDirection::Desc,
            })
            .await
            .unwrap();
        let titles: Vec<&str> = view.iter().map(ModuleWithProgress::title).collect();
        assert_eq!(titles, ["Pronouns", "Nouns"]);
        assert!(view.iter().all(|m| m.status() == ProgressStatus::NotStarted));
    }
}
