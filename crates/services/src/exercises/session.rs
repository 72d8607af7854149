use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use grammar_core::Clock;
use grammar_core::model::{
    Answer, AnswerPatch, Exercise, ExerciseId, ExerciseResult, NextAction, Submission,
};
use storage::repository::{ExerciseRepository, StorageError};
use tracing::{debug, info, warn};

use super::adapters::adapter_for;
use super::drafts::DraftCache;
use super::phase::{FailureKind, FeedbackActions, SessionPhase, SubmitOutcome};
use crate::error::ExerciseSessionError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    exercise_id: Option<ExerciseId>,
    exercise: Option<Exercise>,
    answer: Option<Answer>,
    result: Option<ExerciseResult>,
    started_at: Option<DateTime<Utc>>,
    attempts: u32,
    // Bumped on every navigation; responses tagged with an older value are dropped.
    generation: u64,
    // Shaped answer of the last submission that has not been graded yet.
    pending: Option<Answer>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Loading,
            exercise_id: None,
            exercise: None,
            answer: None,
            result: None,
            started_at: None,
            attempts: 0,
            generation: 0,
            pending: None,
        }
    }

    fn navigate(&mut self, id: Option<ExerciseId>) -> u64 {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            exercise_id: id,
            generation,
            ..Self::new()
        };
        generation
    }

    fn is_complete(&self) -> bool {
        match (&self.exercise, &self.answer) {
            (Some(exercise), Some(answer)) => {
                adapter_for(exercise.exercise_type()).is_complete(answer, exercise.content())
            }
            _ => false,
        }
    }
}

/// Point-in-time copy of a session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub exercise: Option<Exercise>,
    pub answer: Option<Answer>,
    pub result: Option<ExerciseResult>,
    pub attempts: u32,
    pub can_submit: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Drives one exercise from load through graded feedback and retries.
///
/// All methods take `&self`; state lives behind a mutex that is never held
/// across a network call, so a second `submit` issued while the first is in
/// flight sees `Submitting` and is absorbed.
pub struct ExerciseSession {
    clock: Clock,
    exercises: Arc<dyn ExerciseRepository>,
    drafts: DraftCache,
    state: Mutex<SessionState>,
}

impl fmt::Debug for ExerciseSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExerciseSession")
            .field("clock", &self.clock)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl ExerciseSession {
    #[must_use]
    pub fn new(clock: Clock, exercises: Arc<dyn ExerciseRepository>, drafts: DraftCache) -> Self {
        Self {
            clock,
            exercises,
            drafts,
            state: Mutex::new(SessionState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch an exercise and start a fresh attempt on it.
    ///
    /// Resets the attempt counter. A draft left for the same id earlier in
    /// the session is restored and the session starts in `Answering`.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseSessionError::NotFound` when the catalog has no such
    /// exercise, or `ExerciseSessionError::Network` for any other failure.
    /// The session is left in the matching `Error` phase.
    pub async fn load(&self, id: ExerciseId) -> Result<(), ExerciseSessionError> {
        let generation = self.state().navigate(Some(id));
        info!(exercise_id = %id, "loading exercise");

        let fetched = self.exercises.get_exercise(id).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(exercise_id = %id, "discarding stale exercise load");
            return Ok(());
        }
        match fetched {
            Ok(exercise) => {
                let kind = exercise.exercise_type();
                let restored = self
                    .drafts
                    .get(id)
                    .filter(|draft| draft.exercise_type() == kind);
                let has_draft = restored.is_some();
                state.phase = if has_draft {
                    SessionPhase::Answering
                } else {
                    SessionPhase::Ready
                };
                state.answer = Some(restored.unwrap_or_else(|| Answer::empty(kind)));
                state.started_at = Some(self.clock.now());
                state.exercise = Some(exercise);
                info!(exercise_id = %id, exercise_type = %kind, restored = has_draft, "exercise ready");
                Ok(())
            }
            Err(StorageError::NotFound) => {
                state.phase = SessionPhase::Error(FailureKind::NotFound);
                warn!(exercise_id = %id, "exercise not found");
                Err(ExerciseSessionError::NotFound)
            }
            Err(e) => {
                state.phase = SessionPhase::Error(FailureKind::LoadFailed);
                warn!(exercise_id = %id, error = %e, "failed to load exercise");
                Err(ExerciseSessionError::Network(e.to_string()))
            }
        }
    }

    /// Drop the current exercise. Responses still in flight are discarded.
    ///
    /// The in-progress answer stays in the draft cache.
    pub fn leave(&self) {
        let mut state = self.state();
        if let Some(id) = state.exercise_id {
            debug!(exercise_id = %id, "leaving exercise");
        }
        state.navigate(None);
    }

    /// Merge an edit into the current answer.
    ///
    /// Returns `Ok(false)` without touching state when input is closed, i.e.
    /// outside `Ready`/`Answering` or once a result is present.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseSessionError::ContentMismatch` when the edit belongs
    /// to another exercise type.
    pub fn update_answer(&self, patch: AnswerPatch) -> Result<bool, ExerciseSessionError> {
        let mut guard = self.state();
        let state = &mut *guard;
        if !state.phase.accepts_input() || state.result.is_some() {
            debug!(phase = %state.phase, "ignoring answer edit");
            return Ok(false);
        }
        let Some(exercise) = state.exercise.as_ref() else {
            return Ok(false);
        };
        let (id, kind) = (exercise.id(), exercise.exercise_type());
        if patch.exercise_type() != kind {
            return Err(ExerciseSessionError::ContentMismatch {
                exercise: kind,
                patch: patch.exercise_type(),
            });
        }

        let answer = state.answer.get_or_insert_with(|| Answer::empty(kind));
        if !adapter_for(kind).apply(answer, patch) {
            return Ok(false);
        }
        let draft = answer.clone();
        state.phase = SessionPhase::Answering;
        self.drafts.save(id, draft);
        Ok(true)
    }

    /// True when `submit` would reach the grader.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let state = self.state();
        state.phase.accepts_input() && state.is_complete()
    }

    /// Send the current answer to the grader.
    ///
    /// Calls made while a submission is in flight, or after its result
    /// arrived, return `SubmitOutcome::Duplicate` and do nothing.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseSessionError::ValidationBlocked` for an incomplete
    /// answer (nothing is sent), `ExerciseSessionError::InvalidState` before
    /// an exercise is loaded, or `ExerciseSessionError::Network` when grading
    /// fails. After a network failure the answer is kept for `resubmit`.
    pub async fn submit(&self) -> Result<SubmitOutcome, ExerciseSessionError> {
        let (id, submission, generation) = {
            let mut state = self.state();
            let phase = state.phase;
            match phase {
                SessionPhase::Submitting | SessionPhase::Feedback { .. } => {
                    debug!(%phase, "duplicate submit absorbed");
                    return Ok(SubmitOutcome::Duplicate);
                }
                SessionPhase::Ready | SessionPhase::Answering => {}
                _ => return Err(ExerciseSessionError::InvalidState(phase)),
            }
            let (Some(exercise), Some(answer)) = (state.exercise.as_ref(), state.answer.as_ref())
            else {
                return Err(ExerciseSessionError::InvalidState(phase));
            };
            let adapter = adapter_for(exercise.exercise_type());
            if !adapter.is_complete(answer, exercise.content()) {
                debug!(exercise_id = %exercise.id(), "submit blocked: answer incomplete");
                return Err(ExerciseSessionError::ValidationBlocked);
            }
            let id = exercise.id();
            let answer = adapter.to_submission_answer(answer);

            state.pending = Some(answer.clone());
            state.phase = SessionPhase::Submitting;
            let submission = Submission {
                answer,
                time_spent: state.started_at.map(|at| self.clock.elapsed_secs(at)),
            };
            (id, submission, state.generation)
        };
        self.send(id, submission, generation).await
    }

    /// Send the answer that failed to submit again.
    ///
    /// Elapsed time is still measured from the start of the answering phase.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseSessionError::InvalidState` unless the last submit
    /// failed, or `ExerciseSessionError::Network` if it fails again.
    pub async fn resubmit(&self) -> Result<SubmitOutcome, ExerciseSessionError> {
        let (id, submission, generation) = {
            let mut state = self.state();
            let phase = state.phase;
            match phase {
                SessionPhase::Submitting => {
                    debug!(%phase, "duplicate submit absorbed");
                    return Ok(SubmitOutcome::Duplicate);
                }
                SessionPhase::Error(FailureKind::SubmitFailed) => {}
                _ => return Err(ExerciseSessionError::InvalidState(phase)),
            }
            let (Some(id), Some(answer)) = (state.exercise_id, state.pending.clone()) else {
                return Err(ExerciseSessionError::InvalidState(phase));
            };
            state.phase = SessionPhase::Submitting;
            let submission = Submission {
                answer,
                time_spent: state.started_at.map(|at| self.clock.elapsed_secs(at)),
            };
            (id, submission, state.generation)
        };
        self.send(id, submission, generation).await
    }

    async fn send(
        &self,
        id: ExerciseId,
        submission: Submission,
        generation: u64,
    ) -> Result<SubmitOutcome, ExerciseSessionError> {
        info!(exercise_id = %id, time_spent = ?submission.time_spent, "submitting answer");
        let graded = self.exercises.submit(id, &submission).await;

        let mut state = self.state();
        if state.generation != generation {
            debug!(exercise_id = %id, "discarding stale grade");
            return Ok(SubmitOutcome::Discarded);
        }
        match graded {
            Ok(result) => {
                let correct = result.is_correct;
                state.attempts = state.attempts.saturating_add(1);
                state.result = Some(result);
                state.pending = None;
                state.phase = SessionPhase::Feedback { correct };
                self.drafts.discard(id);
                info!(exercise_id = %id, correct, attempts = state.attempts, "answer graded");
                Ok(SubmitOutcome::Graded { correct })
            }
            Err(e) => {
                state.phase = SessionPhase::Error(FailureKind::SubmitFailed);
                warn!(exercise_id = %id, error = %e, "failed to submit answer");
                Err(ExerciseSessionError::Network(e.to_string()))
            }
        }
    }

    /// Leave a failed submit and go back to editing the same answer.
    pub fn resume_editing(&self) -> bool {
        let mut state = self.state();
        if state.phase != SessionPhase::Error(FailureKind::SubmitFailed) {
            return false;
        }
        state.pending = None;
        state.phase = SessionPhase::Answering;
        true
    }

    /// Start another answering phase on the same exercise.
    ///
    /// Only valid from `Feedback`. Clears the answer and result and restarts
    /// the timer; the attempt counter is kept.
    pub fn retry(&self) -> bool {
        let mut state = self.state();
        if !matches!(state.phase, SessionPhase::Feedback { .. }) {
            debug!(phase = %state.phase, "retry ignored");
            return false;
        }
        let Some(kind) = state.exercise.as_ref().map(Exercise::exercise_type) else {
            return false;
        };
        state.answer = Some(Answer::empty(kind));
        state.result = None;
        state.started_at = Some(self.clock.now());
        state.phase = SessionPhase::Answering;
        info!(attempts = state.attempts, "retrying exercise");
        true
    }

    //
    // ─── READ ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    #[must_use]
    pub fn exercise_id(&self) -> Option<ExerciseId> {
        self.state().exercise_id
    }

    #[must_use]
    pub fn exercise(&self) -> Option<Exercise> {
        self.state().exercise.clone()
    }

    #[must_use]
    pub fn answer(&self) -> Option<Answer> {
        self.state().answer.clone()
    }

    #[must_use]
    pub fn result(&self) -> Option<ExerciseResult> {
        self.state().result.clone()
    }

    /// Graded submissions since the last `load`.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.state().attempts
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state().started_at
    }

    /// Why the session is in `Error`, if it is.
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        match self.state().phase {
            SessionPhase::Error(kind) => Some(kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn next_action(&self) -> Option<NextAction> {
        self.state().result.as_ref().and_then(ExerciseResult::next_action)
    }

    /// True when the grader asked the page to move on.
    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.next_action() == Some(NextAction::Continue)
    }

    #[must_use]
    pub fn feedback_actions(&self) -> Option<FeedbackActions> {
        self.state().result.as_ref().map(FeedbackActions::for_result)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            phase: state.phase,
            exercise: state.exercise.clone(),
            answer: state.answer.clone(),
            result: state.result.clone(),
            attempts: state.attempts,
            can_submit: state.phase.accepts_input() && state.is_complete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use grammar_core::model::{Blank, ExerciseContent, Feedback, LessonId, NextSteps};
    use grammar_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    use crate::exercises::Recovery;

    fn multiple_choice() -> Exercise {
        Exercise::new(
            ExerciseId::generate(),
            LessonId::generate(),
            "Nouns",
            "Which word is a noun?",
            ExerciseContent::MultipleChoice {
                options: vec!["Run".into(), "Cat".into(), "Quick".into(), "Blue".into()],
            },
            1,
        )
    }

    fn graded(exercise_id: ExerciseId, is_correct: bool) -> ExerciseResult {
        ExerciseResult {
            exercise_id,
            user_id: None,
            answer: Answer::multiple_choice(1),
            is_correct,
            score: if is_correct { 1.0 } else { 0.0 },
            feedback: Feedback {
                message: "Done".into(),
                next_steps: Some(NextSteps {
                    action: if is_correct {
                        NextAction::Continue
                    } else {
                        NextAction::Retry
                    },
                    message: String::new(),
                }),
                ..Feedback::default()
            },
            time_spent: None,
            submitted_at: None,
        }
    }

    fn setup(exercise: &Exercise, is_correct: bool) -> (InMemoryRepository, ExerciseSession, Clock) {
        let repo = InMemoryRepository::new();
        repo.insert_exercise(exercise.clone()).unwrap();
        repo.script_result(graded(exercise.id(), is_correct)).unwrap();
        let clock = Clock::manual(fixed_now());
        let session = ExerciseSession::new(clock.clone(), Arc::new(repo.clone()), DraftCache::new());
        (repo, session, clock)
    }

    #[tokio::test]
    async fn multiple_choice_submission_carries_elapsed_time() {
        let exercise = multiple_choice();
        let (repo, session, clock) = setup(&exercise, true);

        session.load(exercise.id()).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(!session.can_submit());

        assert!(session.update_answer(AnswerPatch::SelectOption(1)).unwrap());
        assert!(session.can_submit());

        clock.advance(Duration::seconds(12));
        let outcome = session.submit().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Graded { correct: true });

        let submissions = repo.submissions().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].1.answer, Answer::multiple_choice(1));
        assert_eq!(submissions[0].1.time_spent, Some(12));
        assert_eq!(session.attempts(), 1);
        assert!(session.can_continue());
    }

    #[tokio::test]
    async fn incomplete_answer_never_reaches_the_grader() {
        let exercise = multiple_choice();
        let (repo, session, _) = setup(&exercise, true);
        session.load(exercise.id()).await.unwrap();

        let err = session.submit().await.unwrap_err();
        assert_eq!(err, ExerciseSessionError::ValidationBlocked);
        assert!(repo.submissions().unwrap().is_empty());
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn missing_exercise_is_terminal_not_found() {
        let repo = InMemoryRepository::new();
        let session =
            ExerciseSession::new(Clock::manual(fixed_now()), Arc::new(repo), DraftCache::new());

        let err = session.load(ExerciseId::generate()).await.unwrap_err();
        assert_eq!(err, ExerciseSessionError::NotFound);
        assert_eq!(session.failure(), Some(FailureKind::NotFound));
        assert!(!session.update_answer(AnswerPatch::SelectOption(0)).unwrap());
    }

    struct OfflineCatalog;

    #[async_trait]
    impl ExerciseRepository for OfflineCatalog {
        async fn get_exercise(&self, _id: ExerciseId) -> Result<Exercise, StorageError> {
            Err(StorageError::Network("reset".into()))
        }

        async fn submit(
            &self,
            _id: ExerciseId,
            _submission: &Submission,
        ) -> Result<ExerciseResult, StorageError> {
            Err(StorageError::Network("reset".into()))
        }
    }

    #[tokio::test]
    async fn failed_load_offers_reload() {
        let session = ExerciseSession::new(
            Clock::manual(fixed_now()),
            Arc::new(OfflineCatalog),
            DraftCache::new(),
        );

        let err = session.load(ExerciseId::generate()).await.unwrap_err();
        assert!(matches!(err, ExerciseSessionError::Network(_)));
        assert_eq!(session.failure(), Some(FailureKind::LoadFailed));
        assert_eq!(
            session.failure().map(FailureKind::recovery),
            Some(Recovery::Reload)
        );
        assert!(session.exercise().is_none());
    }

    #[tokio::test]
    async fn resume_editing_after_failed_submit_keeps_answer() {
        let exercise = multiple_choice();
        let repo = InMemoryRepository::new();
        // No scripted result, so grading fails.
        repo.insert_exercise(exercise.clone()).unwrap();
        let session =
            ExerciseSession::new(Clock::manual(fixed_now()), Arc::new(repo), DraftCache::new());
        session.load(exercise.id()).await.unwrap();
        session.update_answer(AnswerPatch::SelectOption(2)).unwrap();

        assert!(session.submit().await.is_err());
        assert_eq!(session.failure(), Some(FailureKind::SubmitFailed));
        assert!(session.resume_editing());

        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!(session.answer(), Some(Answer::multiple_choice(2)));
        assert!(session.can_submit());
        assert!(!session.resume_editing());
        assert_eq!(session.attempts(), 0);
    }

    #[tokio::test]
    async fn edits_are_ignored_once_graded() {
        let exercise = multiple_choice();
        let (_, session, _) = setup(&exercise, false);
        session.load(exercise.id()).await.unwrap();
        session.update_answer(AnswerPatch::SelectOption(2)).unwrap();
        session.submit().await.unwrap();

        assert!(!session.update_answer(AnswerPatch::SelectOption(3)).unwrap());
        assert_eq!(session.answer(), Some(Answer::multiple_choice(2)));
        assert_eq!(session.phase(), SessionPhase::Feedback { correct: false });
        assert_eq!(
            session.submit().await.unwrap(),
            SubmitOutcome::Duplicate
        );
        assert!(session.feedback_actions().unwrap().try_again);
    }

    #[tokio::test]
    async fn mismatched_edit_is_rejected() {
        let exercise = multiple_choice();
        let (_, session, _) = setup(&exercise, true);
        session.load(exercise.id()).await.unwrap();

        let err = session
            .update_answer(AnswerPatch::SetSentence("Cat".into()))
            .unwrap_err();
        assert!(matches!(err, ExerciseSessionError::ContentMismatch { .. }));
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn retry_restarts_timer_and_keeps_attempts() {
        let exercise = multiple_choice();
        let (repo, session, clock) = setup(&exercise, false);
        session.load(exercise.id()).await.unwrap();
        session.update_answer(AnswerPatch::SelectOption(0)).unwrap();
        clock.advance(Duration::seconds(30));
        session.submit().await.unwrap();

        assert!(session.retry());
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!(session.answer(), Some(Answer::empty(exercise.exercise_type())));
        assert!(session.result().is_none());
        assert_eq!(session.attempts(), 1);
        assert!(!session.retry());

        clock.advance(Duration::seconds(5));
        session.update_answer(AnswerPatch::SelectOption(1)).unwrap();
        session.submit().await.unwrap();

        let submissions = repo.submissions().unwrap();
        assert_eq!(submissions[1].1.time_spent, Some(5));
        assert_eq!(session.attempts(), 2);
        assert_eq!(session.exercise().map(|e| e.id()), Some(exercise.id()));
    }

    #[tokio::test]
    async fn draft_is_restored_when_returning_to_an_exercise() {
        let exercise = Exercise::new(
            ExerciseId::generate(),
            LessonId::generate(),
            "Articles",
            "Fill in the blanks",
            ExerciseContent::FillInBlank {
                text: "___ cat sat on ___ mat.".into(),
                blanks: vec![
                    Blank {
                        id: "b1".into(),
                        position: 0,
                        correct_answers: vec!["The".into()],
                        case_sensitive: false,
                    },
                    Blank {
                        id: "b2".into(),
                        position: 1,
                        correct_answers: vec!["the".into()],
                        case_sensitive: false,
                    },
                ],
            },
            2,
        );
        let (_, session, _) = setup(&exercise, true);
        session.load(exercise.id()).await.unwrap();
        session
            .update_answer(AnswerPatch::set_blank("b1", "The"))
            .unwrap();
        session.leave();
        assert!(session.exercise().is_none());

        session.load(exercise.id()).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert!(!session.can_submit());
        session
            .update_answer(AnswerPatch::set_blank("b2", "the"))
            .unwrap();
        assert!(session.can_submit());
    }
}
