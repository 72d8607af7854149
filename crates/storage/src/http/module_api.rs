use async_trait::async_trait;
use grammar_core::model::ModuleQuery;

use super::HttpRepository;
use super::mapping::ModulesResponse;
use crate::repository::{ModulePage, ModuleRepository, StorageError};

#[async_trait]
impl ModuleRepository for HttpRepository {
    async fn list_modules(&self, query: &ModuleQuery) -> Result<ModulePage, StorageError> {
        let response: ModulesResponse = self.get_json("modules/", &query.to_pairs()).await?;
        Ok(response.into_page())
    }
}
