use async_trait::async_trait;
use grammar_core::model::{
    Exercise, ExerciseId, ExerciseResult, Module, ModuleQuery, ProgressSummary, Submission,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by data-access backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("network error: {0}")]
    Network(String),

    #[error("request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl StorageError {
    /// True for failures the user may retry by hand.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, StorageError::NotFound | StorageError::Unauthorized)
    }
}

/// One page of the module catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePage {
    pub modules: Vec<Module>,
    pub total: u32,
}

/// Catalog and grading contract for exercises.
#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Fetch an exercise by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the exercise does not exist, or
    /// other backend errors.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError>;

    /// Hand a submission to the grader.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the submission cannot be graded.
    async fn submit(
        &self,
        id: ExerciseId,
        submission: &Submission,
    ) -> Result<ExerciseResult, StorageError>;
}

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// List catalog modules matching the query.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_modules(&self, query: &ModuleQuery) -> Result<ModulePage, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the per-user progress summary.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be read.
    async fn progress_summary(&self) -> Result<ProgressSummary, StorageError>;
}

/// Simple in-memory backend for testing and prototyping.
///
/// Grading is scripted: `script_result` registers the result returned for an
/// exercise, with the submitted answer and elapsed time echoed back.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    exercises: Arc<Mutex<HashMap<ExerciseId, Exercise>>>,
    results: Arc<Mutex<HashMap<ExerciseId, ExerciseResult>>>,
    submissions: Arc<Mutex<Vec<(ExerciseId, Submission)>>>,
    modules: Arc<Mutex<Vec<Module>>>,
    summary: Arc<Mutex<ProgressSummary>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert_exercise(&self, exercise: Exercise) -> Result<(), StorageError> {
        let mut guard = self.exercises.lock().map_err(poisoned)?;
        guard.insert(exercise.id(), exercise);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn script_result(&self, result: ExerciseResult) -> Result<(), StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        guard.insert(result.exercise_id, result);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn set_modules(&self, modules: Vec<Module>) -> Result<(), StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        *guard = modules;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn set_summary(&self, summary: ProgressSummary) -> Result<(), StorageError> {
        let mut guard = self.summary.lock().map_err(poisoned)?;
        *guard = summary;
        Ok(())
    }

    /// Submissions received so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<(ExerciseId, Submission)>, StorageError> {
        let guard = self.submissions.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRepository {
    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError> {
        let guard = self.exercises.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn submit(
        &self,
        id: ExerciseId,
        submission: &Submission,
    ) -> Result<ExerciseResult, StorageError> {
        self.submissions
            .lock()
            .map_err(poisoned)?
            .push((id, submission.clone()));

        let guard = self.results.lock().map_err(poisoned)?;
        let mut result = guard.get(&id).cloned().ok_or(StorageError::NotFound)?;
        result.answer = submission.answer.clone();
        result.time_spent = submission.time_spent;
        Ok(result)
    }
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn list_modules(&self, query: &ModuleQuery) -> Result<ModulePage, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<Module> = guard
            .iter()
            .filter(|module| match &needle {
                None => true,
                Some(needle) => {
                    module.title.to_lowercase().contains(needle)
                        || module
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                }
            })
            .cloned()
            .collect();
        matching.sort_by_key(|module| module.order);

        let total = u32::try_from(matching.len()).unwrap_or(u32::MAX);
        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let modules = matching.into_iter().skip(skip).take(limit).collect();

        Ok(ModulePage { modules, total })
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn progress_summary(&self) -> Result<ProgressSummary, StorageError> {
        let guard = self.summary.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

/// Aggregates the collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub exercises: Arc<dyn ExerciseRepository>,
    pub modules: Arc<dyn ModuleRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let exercises: Arc<dyn ExerciseRepository> = Arc::new(repo.clone());
        let modules: Arc<dyn ModuleRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            exercises,
            modules,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammar_core::model::{
        Answer, ExerciseContent, Feedback, LessonId, ModuleId,
    };

    fn build_exercise() -> Exercise {
        Exercise::new(
            ExerciseId::generate(),
            LessonId::generate(),
            "Nouns",
            "Pick the noun",
            ExerciseContent::MultipleChoice {
                options: vec!["Run".into(), "Cat".into()],
            },
            1,
        )
    }

    #[tokio::test]
    async fn missing_exercise_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_exercise(ExerciseId::generate()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn scripted_result_echoes_submission() {
        let repo = InMemoryRepository::new();
        let exercise = build_exercise();
        repo.insert_exercise(exercise.clone()).unwrap();
        repo.script_result(ExerciseResult {
            exercise_id: exercise.id(),
            user_id: None,
            answer: Answer::multiple_choice(0),
            is_correct: true,
            score: 1.0,
            feedback: Feedback::default(),
            time_spent: None,
            submitted_at: None,
        })
        .unwrap();

        let submission = Submission {
            answer: Answer::multiple_choice(1),
            time_spent: Some(7),
        };
        let result = repo.submit(exercise.id(), &submission).await.unwrap();

        assert_eq!(result.answer, Answer::multiple_choice(1));
        assert_eq!(result.time_spent, Some(7));
        assert_eq!(repo.submissions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_modules_searches_and_paginates() {
        let repo = InMemoryRepository::new();
        repo.set_modules(vec![
            Module::new(ModuleId::generate(), "Verbs", 2, 4),
            Module::new(ModuleId::generate(), "Nouns", 1, 3).with_description("Naming words"),
            Module::new(ModuleId::generate(), "Adverbs", 3, 5),
        ])
        .unwrap();

        let page = repo
            .list_modules(&ModuleQuery {
                search: Some("VERB".into()),
                ..ModuleQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.modules[0].title, "Verbs");

        let page = repo
            .list_modules(&ModuleQuery {
                skip: Some(1),
                limit: Some(1),
                ..ModuleQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.modules.len(), 1);
        assert_eq!(page.modules[0].order, 2);
    }
}
