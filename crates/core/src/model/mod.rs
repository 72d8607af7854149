mod answer;
mod exercise;
mod ids;
mod listing;
mod module;
mod progress;
mod result;

pub use answer::{Answer, AnswerPatch, Submission};
pub use exercise::{
    Blank, Exercise, ExerciseContent, ExerciseContentError, ExerciseRecord, ExerciseType,
    RawContent, TargetElement,
};
pub use ids::{ExerciseId, LessonId, ModuleId, ParseIdError};
pub use listing::{ModuleQuery, SortDirection, SortKey, StatusFilter};
pub use module::{Difficulty, Module};
pub use progress::{
    ModuleProgress, ModuleProgressRecord, ModuleWithProgress, ProgressStatus, ProgressSummary,
};
pub use result::{ExerciseResult, Feedback, NextAction, NextSteps};
