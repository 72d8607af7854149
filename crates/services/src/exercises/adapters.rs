use grammar_core::model::{Answer, AnswerPatch, ExerciseContent, ExerciseType};

/// Per-type policy for answer completeness and submission shaping.
///
/// Adapters gate submit-ability only. Judging correctness is the grader's job.
pub trait ExerciseAdapter: Send + Sync {
    fn exercise_type(&self) -> ExerciseType;

    /// True when `answer` may be submitted for `content`.
    fn is_complete(&self, answer: &Answer, content: &ExerciseContent) -> bool;

    /// Shape the in-progress answer into what the grader receives.
    fn to_submission_answer(&self, answer: &Answer) -> Answer;

    /// Merge `patch` into `answer`. Returns false and leaves `answer`
    /// untouched when the patch does not belong to this exercise type.
    fn apply(&self, answer: &mut Answer, patch: AnswerPatch) -> bool;
}

/// Returns the adapter for an exercise type.
#[must_use]
pub fn adapter_for(kind: ExerciseType) -> &'static dyn ExerciseAdapter {
    match kind {
        ExerciseType::MultipleChoice => &MultipleChoiceAdapter,
        ExerciseType::FillInBlank => &FillInBlankAdapter,
        ExerciseType::Identification => &IdentificationAdapter,
        ExerciseType::SentenceConstruction => &SentenceConstructionAdapter,
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn replace_if_same_type(answer: &mut Answer, replacement: Answer) -> bool {
    if answer.exercise_type() != replacement.exercise_type() {
        return false;
    }
    *answer = replacement;
    true
}

//
// ─── MULTIPLE CHOICE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct MultipleChoiceAdapter;

impl ExerciseAdapter for MultipleChoiceAdapter {
    fn exercise_type(&self) -> ExerciseType {
        ExerciseType::MultipleChoice
    }

    fn is_complete(&self, answer: &Answer, content: &ExerciseContent) -> bool {
        match (answer, content) {
            (
                Answer::MultipleChoice {
                    selected_option: Some(index),
                },
                ExerciseContent::MultipleChoice { options },
            ) => *index < options.len(),
            _ => false,
        }
    }

    fn to_submission_answer(&self, answer: &Answer) -> Answer {
        answer.clone()
    }

    fn apply(&self, answer: &mut Answer, patch: AnswerPatch) -> bool {
        match (answer, patch) {
            (Answer::MultipleChoice { selected_option }, AnswerPatch::SelectOption(index)) => {
                *selected_option = Some(index);
                true
            }
            (answer, AnswerPatch::Replace(replacement)) => {
                replace_if_same_type(answer, replacement)
            }
            _ => false,
        }
    }
}

//
// ─── FILL IN BLANK ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct FillInBlankAdapter;

impl ExerciseAdapter for FillInBlankAdapter {
    fn exercise_type(&self) -> ExerciseType {
        ExerciseType::FillInBlank
    }

    fn is_complete(&self, answer: &Answer, content: &ExerciseContent) -> bool {
        let (Answer::FillInBlank { blank_answers }, ExerciseContent::FillInBlank { blanks, .. }) =
            (answer, content)
        else {
            return false;
        };
        blanks.iter().all(|blank| {
            blank_answers
                .get(&blank.id)
                .is_some_and(|value| !is_blank(value))
        })
    }

    fn to_submission_answer(&self, answer: &Answer) -> Answer {
        match answer {
            Answer::FillInBlank { blank_answers } => Answer::FillInBlank {
                blank_answers: blank_answers
                    .iter()
                    .filter(|(_, value)| !is_blank(value))
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect(),
            },
            other => other.clone(),
        }
    }

    fn apply(&self, answer: &mut Answer, patch: AnswerPatch) -> bool {
        match (answer, patch) {
            (Answer::FillInBlank { blank_answers }, AnswerPatch::SetBlank { blank_id, value }) => {
                blank_answers.insert(blank_id, value);
                true
            }
            (answer, AnswerPatch::Replace(replacement)) => {
                replace_if_same_type(answer, replacement)
            }
            _ => false,
        }
    }
}

//
// ─── IDENTIFICATION ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentificationAdapter;

impl ExerciseAdapter for IdentificationAdapter {
    fn exercise_type(&self) -> ExerciseType {
        ExerciseType::Identification
    }

    fn is_complete(&self, answer: &Answer, content: &ExerciseContent) -> bool {
        matches!(content, ExerciseContent::Identification { .. })
            && matches!(
                answer,
                Answer::Identification { identified_elements }
                    if identified_elements.iter().any(|id| !is_blank(id))
            )
    }

    fn to_submission_answer(&self, answer: &Answer) -> Answer {
        match answer {
            Answer::Identification {
                identified_elements,
            } => {
                let mut unique: Vec<String> = Vec::with_capacity(identified_elements.len());
                for id in identified_elements {
                    if !is_blank(id) && !unique.contains(id) {
                        unique.push(id.clone());
                    }
                }
                Answer::Identification {
                    identified_elements: unique,
                }
            }
            other => other.clone(),
        }
    }

    fn apply(&self, answer: &mut Answer, patch: AnswerPatch) -> bool {
        match (answer, patch) {
            (
                Answer::Identification {
                    identified_elements,
                },
                AnswerPatch::ToggleElement(id),
            ) => {
                if is_blank(&id) {
                    return false;
                }
                if let Some(pos) = identified_elements.iter().position(|e| *e == id) {
                    identified_elements.remove(pos);
                } else {
                    identified_elements.push(id);
                }
                true
            }
            (answer, AnswerPatch::Replace(replacement)) => {
                replace_if_same_type(answer, replacement)
            }
            _ => false,
        }
    }
}

//
// ─── SENTENCE CONSTRUCTION ─────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceConstructionAdapter;

impl ExerciseAdapter for SentenceConstructionAdapter {
    fn exercise_type(&self) -> ExerciseType {
        ExerciseType::SentenceConstruction
    }

    fn is_complete(&self, answer: &Answer, content: &ExerciseContent) -> bool {
        matches!(content, ExerciseContent::SentenceConstruction { .. })
            && matches!(
                answer,
                Answer::SentenceConstruction { constructed_sentence } if !is_blank(constructed_sentence)
            )
    }

    fn to_submission_answer(&self, answer: &Answer) -> Answer {
        match answer {
            Answer::SentenceConstruction {
                constructed_sentence,
            } => Answer::sentence(constructed_sentence.trim()),
            other => other.clone(),
        }
    }

    fn apply(&self, answer: &mut Answer, patch: AnswerPatch) -> bool {
        match (answer, patch) {
            (
                Answer::SentenceConstruction {
                    constructed_sentence,
                },
                AnswerPatch::SetSentence(text),
            ) => {
                *constructed_sentence = text;
                true
            }
            (answer, AnswerPatch::Replace(replacement)) => {
                replace_if_same_type(answer, replacement)
            }
            _ => false,
        }
    }
}
