#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exercises;
pub mod progress;

pub use grammar_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ExerciseSessionError, ProgressServiceError};
pub use exercises::{
    DraftCache, ExerciseAdapter, ExerciseSession, FailureKind, FeedbackActions, Recovery,
    SessionPhase, SessionSnapshot, SubmitOutcome, WordBank, adapter_for,
};
pub use progress::{ModuleFilters, OverallStats, ProgressOverview, ProgressService};
