use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use grammar_core::model::{Answer, ExerciseId};

/// Unsubmitted answers kept for the length of a learning session.
///
/// Clones share the same cache, so every controller built from one
/// `AppServices` sees the same drafts. Call `clear` when the session ends.
#[derive(Debug, Clone, Default)]
pub struct DraftCache {
    inner: Arc<Mutex<HashMap<ExerciseId, Answer>>>,
}

impl DraftCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ExerciseId, Answer>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn save(&self, id: ExerciseId, answer: Answer) {
        self.lock().insert(id, answer);
    }

    #[must_use]
    pub fn get(&self, id: ExerciseId) -> Option<Answer> {
        self.lock().get(&id).cloned()
    }

    pub fn discard(&self, id: ExerciseId) {
        self.lock().remove(&id);
    }

    /// Drops every draft.
    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_drafts() {
        let cache = DraftCache::new();
        let other = cache.clone();
        let id = ExerciseId::generate();

        other.save(id, Answer::multiple_choice(2));
        assert_eq!(cache.get(id), Some(Answer::multiple_choice(2)));

        cache.discard(id);
        assert!(other.is_empty());
    }

    #[test]
    fn clear_evicts_everything() {
        let cache = DraftCache::new();
        cache.save(ExerciseId::generate(), Answer::sentence("a"));
        cache.save(ExerciseId::generate(), Answer::sentence("b"));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
