use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::repository::{
    ExerciseRepository, ModuleRepository, ProgressRepository, Storage, StorageError,
};

mod config;
mod exercise_api;
mod mapping;
mod module_api;
mod progress_api;

pub use config::{ApiConfig, BearerToken, CredentialSource, StaticCredential, normalize_base_url};

use mapping::{looks_like_html, map_status, network, ser};

/// JSON-over-HTTP backend for the catalog, grading and progress services.
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
    config: ApiConfig,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpRepository {
    /// Build a repository that sends the configured token on every call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, StorageError> {
        let credentials = Arc::new(StaticCredential::new(config.token.clone()));
        Self::with_credentials(config, credentials)
    }

    /// Build a repository that asks `credentials` for a token per request.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn with_credentials(
        config: ApiConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer() {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, StorageError> {
        let url = self.config.endpoint(path);
        debug!(method = "GET", path, "api request");
        let request = self.authorize(self.client.get(&url).query(query));
        let response = request.send().await.map_err(network)?;
        read_json(response, path).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, StorageError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!(method = "POST", path, "api request");
        let request = self.authorize(self.client.post(&url).json(body));
        let response = request.send().await.map_err(network)?;
        read_json(response, path).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, StorageError> {
    let status = response.status();
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html") || v.contains("application/html"));
    let body = response.text().await.map_err(network)?;
    debug!(path, status = status.as_u16(), "api response");

    if !status.is_success() {
        warn!(path, status = status.as_u16(), "api request failed");
        return Err(map_status(status, &body));
    }
    if is_html || looks_like_html(&body) {
        warn!(path, "api returned html instead of json");
        return Err(StorageError::Serialization(
            "server returned HTML instead of JSON".into(),
        ));
    }
    serde_json::from_str(&body).map_err(ser)
}

impl Storage {
    /// Build a `Storage` whose collaborators all speak HTTP.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn http(config: ApiConfig) -> Result<Self, StorageError> {
        let repo = HttpRepository::new(config)?;
        let exercises: Arc<dyn ExerciseRepository> = Arc::new(repo.clone());
        let modules: Arc<dyn ModuleRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Ok(Self {
            exercises,
            modules,
            progress,
        })
    }
}
