use async_trait::async_trait;
use grammar_core::model::ProgressSummary;

use super::HttpRepository;
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for HttpRepository {
    async fn progress_summary(&self) -> Result<ProgressSummary, StorageError> {
        self.get_json("progress/summary", &[]).await
    }
}
