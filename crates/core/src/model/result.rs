use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::answer::Answer;
use crate::model::ids::ExerciseId;

/// Directive that decides which follow-up button the feedback view offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Retry,
    Continue,
    Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSteps {
    pub action: NextAction,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<NextSteps>,
}

/// Graded outcome of one submission, as returned by the grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_id: ExerciseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub answer: Answer,
    pub is_correct: bool,
    /// In `[0, 1]`.
    pub score: f64,
    #[serde(default)]
    pub feedback: Feedback,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ExerciseResult {
    #[must_use]
    pub fn next_action(&self) -> Option<NextAction> {
        self.feedback.next_steps.as_ref().map(|steps| steps.action)
    }

    /// Score as a whole percentage, clamped to 0..=100.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn score_percent(&self) -> u8 {
        if !self.score.is_finite() {
            return 0;
        }
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    #[must_use]
    pub fn hints(&self) -> &[String] {
        self.feedback.hints.as_deref().unwrap_or_default()
    }
}
