use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::exercise::ExerciseType;

/// A user's answer, one variant per exercise type.
///
/// Serializes as a single-key object, e.g. `{"selected_option":1}` or
/// `{"constructed_sentence":"The cat sat"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    FillInBlank {
        blank_answers: BTreeMap<String, String>,
    },
    Identification {
        identified_elements: Vec<String>,
    },
    SentenceConstruction {
        constructed_sentence: String,
    },
    // Last: an empty object deserializes to an unanswered multiple choice.
    MultipleChoice {
        selected_option: Option<usize>,
    },
}

impl Answer {
    /// Returns the blank answer for the given exercise type.
    #[must_use]
    pub fn empty(kind: ExerciseType) -> Self {
        match kind {
            ExerciseType::MultipleChoice => Answer::MultipleChoice {
                selected_option: None,
            },
            ExerciseType::FillInBlank => Answer::FillInBlank {
                blank_answers: BTreeMap::new(),
            },
            ExerciseType::Identification => Answer::Identification {
                identified_elements: Vec::new(),
            },
            ExerciseType::SentenceConstruction => Answer::SentenceConstruction {
                constructed_sentence: String::new(),
            },
        }
    }

    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            Answer::MultipleChoice { .. } => ExerciseType::MultipleChoice,
            Answer::FillInBlank { .. } => ExerciseType::FillInBlank,
            Answer::Identification { .. } => ExerciseType::Identification,
            Answer::SentenceConstruction { .. } => ExerciseType::SentenceConstruction,
        }
    }

    #[must_use]
    pub fn multiple_choice(index: usize) -> Self {
        Answer::MultipleChoice {
            selected_option: Some(index),
        }
    }

    #[must_use]
    pub fn sentence(text: impl Into<String>) -> Self {
        Answer::SentenceConstruction {
            constructed_sentence: text.into(),
        }
    }
}

/// A partial edit applied to the in-progress answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPatch {
    SelectOption(usize),
    SetBlank { blank_id: String, value: String },
    /// Selects the element, or deselects it when already selected.
    ToggleElement(String),
    SetSentence(String),
    Replace(Answer),
}

impl AnswerPatch {
    #[must_use]
    pub fn set_blank(blank_id: impl Into<String>, value: impl Into<String>) -> Self {
        AnswerPatch::SetBlank {
            blank_id: blank_id.into(),
            value: value.into(),
        }
    }

    /// The only exercise type this patch can be merged into.
    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            AnswerPatch::SelectOption(_) => ExerciseType::MultipleChoice,
            AnswerPatch::SetBlank { .. } => ExerciseType::FillInBlank,
            AnswerPatch::ToggleElement(_) => ExerciseType::Identification,
            AnswerPatch::SetSentence(_) => ExerciseType::SentenceConstruction,
            AnswerPatch::Replace(answer) => answer.exercise_type(),
        }
    }
}

/// Payload posted to the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub answer: Answer,
    /// Whole seconds since the current answering phase started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answers_serialize_as_single_key_objects() {
        let mut blanks = BTreeMap::new();
        blanks.insert("b1".to_string(), "cat".to_string());

        assert_eq!(
            serde_json::to_value(Answer::multiple_choice(1)).unwrap(),
            json!({ "selected_option": 1 })
        );
        assert_eq!(
            serde_json::to_value(Answer::FillInBlank { blank_answers: blanks }).unwrap(),
            json!({ "blank_answers": { "b1": "cat" } })
        );
        assert_eq!(
            serde_json::to_value(Answer::sentence("The cat sat")).unwrap(),
            json!({ "constructed_sentence": "The cat sat" })
        );
    }

    #[test]
    fn echoed_answers_deserialize_into_the_right_variant() {
        let answer: Answer = serde_json::from_value(json!({ "identified_elements": ["e2"] })).unwrap();
        assert_eq!(answer.exercise_type(), ExerciseType::Identification);

        let answer: Answer = serde_json::from_value(json!({ "selected_option": 3 })).unwrap();
        assert_eq!(answer, Answer::multiple_choice(3));
    }

    #[test]
    fn empty_answer_matches_requested_type() {
        for kind in ExerciseType::ALL {
            assert_eq!(Answer::empty(kind).exercise_type(), kind);
        }
    }

    #[test]
    fn submission_omits_unknown_elapsed_time() {
        let submission = Submission {
            answer: Answer::multiple_choice(1),
            time_spent: None,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({ "answer": { "selected_option": 1 } })
        );
    }

    #[test]
    fn replace_patch_reports_inner_type() {
        let patch = AnswerPatch::Replace(Answer::sentence("hi"));
        assert_eq!(patch.exercise_type(), ExerciseType::SentenceConstruction);
        assert_eq!(
            AnswerPatch::set_blank("b1", "x").exercise_type(),
            ExerciseType::FillInBlank
        );
    }
}
