use std::fmt;

use grammar_core::model::{ExerciseResult, NextAction};

/// Why a session landed in the error phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    LoadFailed,
    SubmitFailed,
}

/// What the user can do from an error screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    GoBack,
    Reload,
    Resubmit,
}

impl FailureKind {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::NotFound => "Exercise not found",
            FailureKind::LoadFailed => "Failed to load exercise. Please try again.",
            FailureKind::SubmitFailed => "Failed to submit answer. Please try again.",
        }
    }

    #[must_use]
    pub fn recovery(self) -> Recovery {
        match self {
            FailureKind::NotFound => Recovery::GoBack,
            FailureKind::LoadFailed => Recovery::Reload,
            FailureKind::SubmitFailed => Recovery::Resubmit,
        }
    }
}

/// Lifecycle of one exercise attempt.
///
/// `Loading -> Ready -> Answering -> Submitting -> Feedback`, with `Error`
/// reachable from `Loading` and `Submitting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Loading,
    Ready,
    Answering,
    Submitting,
    Feedback { correct: bool },
    Error(FailureKind),
}

impl SessionPhase {
    /// True while the answer may still be edited.
    #[must_use]
    pub fn accepts_input(self) -> bool {
        matches!(self, SessionPhase::Ready | SessionPhase::Answering)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Loading => f.write_str("loading"),
            SessionPhase::Ready => f.write_str("ready"),
            SessionPhase::Answering => f.write_str("answering"),
            SessionPhase::Submitting => f.write_str("submitting"),
            SessionPhase::Feedback { correct: true } => f.write_str("showing correct feedback"),
            SessionPhase::Feedback { correct: false } => {
                f.write_str("showing incorrect feedback")
            }
            SessionPhase::Error(kind) => write!(f, "in error ({})", kind.message()),
        }
    }
}

/// Result of a `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Graded { correct: bool },
    /// A submission for this answering phase was already sent.
    Duplicate,
    /// The session moved to another exercise before the grade arrived.
    Discarded,
}

/// Buttons the feedback view offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedbackActions {
    pub try_again: bool,
    pub continue_on: bool,
    pub review: bool,
}

impl FeedbackActions {
    #[must_use]
    pub fn for_result(result: &ExerciseResult) -> Self {
        let next = result.next_action();
        Self {
            try_again: !result.is_correct,
            continue_on: next == Some(NextAction::Continue),
            review: next == Some(NextAction::Review),
        }
    }
}
