use async_trait::async_trait;
use grammar_core::model::{Exercise, ExerciseId, ExerciseResult, Submission};

use super::HttpRepository;
use crate::repository::{ExerciseRepository, StorageError};

#[async_trait]
impl ExerciseRepository for HttpRepository {
    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError> {
        self.get_json(&format!("exercises/{id}"), &[]).await
    }

    async fn submit(
        &self,
        id: ExerciseId,
        submission: &Submission,
    ) -> Result<ExerciseResult, StorageError> {
        self.post_json(&format!("exercises/{id}/submit"), submission)
            .await
    }
}
