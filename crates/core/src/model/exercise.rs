use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExerciseId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Raised when a fetched content payload does not fit its declared exercise type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseContentError {
    #[error("{kind} exercise is missing `{field}` in its content")]
    MissingField {
        kind: ExerciseType,
        field: &'static str,
    },

    #[error("multiple choice exercise has no options")]
    NoOptions,

    #[error("fill in blank exercise has no blanks")]
    NoBlanks,

    #[error("blank id `{0}` appears more than once")]
    DuplicateBlankId(String),

    #[error("identification exercise has no target elements")]
    NoTargetElements,

    #[error("sentence construction exercise has an empty word bank")]
    EmptyWordBank,
}

//
// ─── EXERCISE TYPE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    MultipleChoice,
    FillInBlank,
    Identification,
    SentenceConstruction,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 4] = [
        ExerciseType::MultipleChoice,
        ExerciseType::FillInBlank,
        ExerciseType::Identification,
        ExerciseType::SentenceConstruction,
    ];

    /// Wire name, e.g. `fill_in_blank`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseType::MultipleChoice => "multiple_choice",
            ExerciseType::FillInBlank => "fill_in_blank",
            ExerciseType::Identification => "identification",
            ExerciseType::SentenceConstruction => "sentence_construction",
        }
    }

    /// Human label shown in the exercise header.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExerciseType::MultipleChoice => "multiple choice",
            ExerciseType::FillInBlank => "fill in blank",
            ExerciseType::Identification => "identification",
            ExerciseType::SentenceConstruction => "sentence construction",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// A blank slot in a fill-in-blank template.
///
/// Accepted answers and case rules are only consumed by the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blank {
    pub id: String,
    pub position: u32,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// A selectable element of an identification target text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetElement {
    pub id: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub explanation: String,
}

/// Variant-specific exercise payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseContent {
    MultipleChoice {
        options: Vec<String>,
    },
    FillInBlank {
        text: String,
        blanks: Vec<Blank>,
    },
    Identification {
        target_text: String,
        target_elements: Vec<TargetElement>,
    },
    SentenceConstruction {
        words: Vec<String>,
    },
}

impl ExerciseContent {
    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            ExerciseContent::MultipleChoice { .. } => ExerciseType::MultipleChoice,
            ExerciseContent::FillInBlank { .. } => ExerciseType::FillInBlank,
            ExerciseContent::Identification { .. } => ExerciseType::Identification,
            ExerciseContent::SentenceConstruction { .. } => ExerciseType::SentenceConstruction,
        }
    }

    /// Narrows a loosely shaped wire payload to the variant named by `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseContentError` when the fields required by `kind` are
    /// missing or empty.
    pub fn from_raw(kind: ExerciseType, raw: RawContent) -> Result<Self, ExerciseContentError> {
        let missing = |field| ExerciseContentError::MissingField { kind, field };
        match kind {
            ExerciseType::MultipleChoice => {
                let options = raw.options.ok_or_else(|| missing("options"))?;
                if options.is_empty() {
                    return Err(ExerciseContentError::NoOptions);
                }
                Ok(ExerciseContent::MultipleChoice { options })
            }
            ExerciseType::FillInBlank => {
                let blanks = raw.blanks.ok_or_else(|| missing("blanks"))?;
                if blanks.is_empty() {
                    return Err(ExerciseContentError::NoBlanks);
                }
                let mut seen = HashSet::with_capacity(blanks.len());
                for blank in &blanks {
                    if !seen.insert(blank.id.as_str()) {
                        return Err(ExerciseContentError::DuplicateBlankId(blank.id.clone()));
                    }
                }
                Ok(ExerciseContent::FillInBlank {
                    text: raw.text.unwrap_or_default(),
                    blanks,
                })
            }
            ExerciseType::Identification => {
                let target_elements = raw.target_elements.ok_or_else(|| missing("target_elements"))?;
                if target_elements.is_empty() {
                    return Err(ExerciseContentError::NoTargetElements);
                }
                Ok(ExerciseContent::Identification {
                    target_text: raw.target_text.unwrap_or_default(),
                    target_elements,
                })
            }
            ExerciseType::SentenceConstruction => {
                let words = raw.words.ok_or_else(|| missing("words"))?;
                if words.is_empty() {
                    return Err(ExerciseContentError::EmptyWordBank);
                }
                Ok(ExerciseContent::SentenceConstruction { words })
            }
        }
    }

    #[must_use]
    pub fn into_raw(self) -> RawContent {
        match self {
            ExerciseContent::MultipleChoice { options } => RawContent {
                options: Some(options),
                ..RawContent::default()
            },
            ExerciseContent::FillInBlank { text, blanks } => RawContent {
                text: Some(text),
                blanks: Some(blanks),
                ..RawContent::default()
            },
            ExerciseContent::Identification {
                target_text,
                target_elements,
            } => RawContent {
                target_text: Some(target_text),
                target_elements: Some(target_elements),
                ..RawContent::default()
            },
            ExerciseContent::SentenceConstruction { words } => RawContent {
                words: Some(words),
                ..RawContent::default()
            },
        }
    }
}

/// Flat content object as it travels on the wire.
///
/// Grader-only keys (`correct_answer`, `correct_sentence`, ...) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blanks: Option<Vec<Blank>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_elements: Option<Vec<TargetElement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// A single exercise as fetched from the catalog. Read-only to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ExerciseRecord", into = "ExerciseRecord")]
pub struct Exercise {
    id: ExerciseId,
    lesson_id: LessonId,
    title: String,
    prompt: String,
    content: ExerciseContent,
    order: u32,
    created_at: Option<DateTime<Utc>>,
}

impl Exercise {
    #[must_use]
    pub fn new(
        id: ExerciseId,
        lesson_id: LessonId,
        title: impl Into<String>,
        prompt: impl Into<String>,
        content: ExerciseContent,
        order: u32,
    ) -> Self {
        Self {
            id,
            lesson_id,
            title: title.into(),
            prompt: prompt.into(),
            content,
            order,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        self.content.exercise_type()
    }

    #[must_use]
    pub fn content(&self) -> &ExerciseContent {
        &self.content
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Wire shape of an exercise: `type` beside a flat `content` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: ExerciseId,
    pub lesson_id: LessonId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub content: RawContent,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExerciseRecord> for Exercise {
    type Error = ExerciseContentError;

    fn try_from(record: ExerciseRecord) -> Result<Self, Self::Error> {
        let content = ExerciseContent::from_raw(record.kind, record.content)?;
        Ok(Self {
            id: record.id,
            lesson_id: record.lesson_id,
            title: record.title,
            prompt: record.prompt,
            content,
            order: record.order,
            created_at: record.created_at,
        })
    }
}

impl From<Exercise> for ExerciseRecord {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            lesson_id: exercise.lesson_id,
            title: exercise.title,
            kind: exercise.content.exercise_type(),
            prompt: exercise.prompt,
            content: exercise.content.into_raw(),
            order: exercise.order,
            created_at: exercise.created_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
