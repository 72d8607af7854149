use std::sync::Arc;

use storage::http::ApiConfig;
use storage::repository::{ExerciseRepository, Storage};
use tracing::debug;

use crate::Clock;
use crate::error::AppServicesError;
use crate::exercises::{DraftCache, ExerciseSession};
use crate::progress::ProgressService;

/// Assembles app-facing services for one learning session.
///
/// Exercise sessions built here share one draft cache; `end_session` is its
/// eviction point.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    drafts: DraftCache,
    exercises: Arc<dyn ExerciseRepository>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services that talk to the remote API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn new_http(config: ApiConfig, clock: Clock) -> Result<Self, AppServicesError> {
        debug!(base_url = %config.base_url, "building http services");
        let storage = Storage::http(config)?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over any storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.modules),
            Arc::clone(&storage.progress),
        ));
        Self {
            clock,
            drafts: DraftCache::new(),
            exercises: Arc::clone(&storage.exercises),
            progress,
        }
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// A fresh controller for one exercise page.
    #[must_use]
    pub fn exercise_session(&self) -> ExerciseSession {
        ExerciseSession::new(
            self.clock.clone(),
            Arc::clone(&self.exercises),
            self.drafts.clone(),
        )
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn drafts(&self) -> &DraftCache {
        &self.drafts
    }

    /// Session teardown: forget every unsubmitted answer.
    pub fn end_session(&self) {
        debug!(drafts = self.drafts.len(), "ending learning session");
        self.drafts.clear();
    }
}
