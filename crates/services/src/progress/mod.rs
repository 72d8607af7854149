mod reconcile;
mod service;
mod views;

// Public API of the progress subsystem.
pub use crate::error::ProgressServiceError;
pub use reconcile::{estimated_completion, percentage, reconcile};
pub use service::{ProgressOverview, ProgressService};
pub use views::{
    LearningStreak, ModuleFilters, OverallStats, filter, is_available, learning_streak,
    next_recommended, overall_stats, sort,
};
