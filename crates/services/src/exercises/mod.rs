mod adapters;
mod drafts;
mod phase;
mod session;
mod word_bank;

// Public API of the exercise subsystem.
pub use crate::error::ExerciseSessionError;
pub use adapters::{
    ExerciseAdapter, FillInBlankAdapter, IdentificationAdapter, MultipleChoiceAdapter,
    SentenceConstructionAdapter, adapter_for,
};
pub use drafts::DraftCache;
pub use phase::{FailureKind, FeedbackActions, Recovery, SessionPhase, SubmitOutcome};
pub use session::{ExerciseSession, SessionSnapshot};
pub use word_bank::WordBank;
