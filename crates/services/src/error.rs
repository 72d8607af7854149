//! Shared error types for the services crate.

use thiserror::Error;

use grammar_core::model::ExerciseType;
use storage::repository::StorageError;

use crate::exercises::SessionPhase;

/// Errors emitted by `ExerciseSession`.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseSessionError {
    #[error("exercise not found")]
    NotFound,
    #[error("network failure: {0}")]
    Network(String),
    #[error("answer is incomplete")]
    ValidationBlocked,
    #[error("operation not allowed while {0}")]
    InvalidState(SessionPhase),
    #[error("{patch} edit does not fit a {exercise} exercise")]
    ContentMismatch {
        exercise: ExerciseType,
        patch: ExerciseType,
    },
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
