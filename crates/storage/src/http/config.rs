use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";
const API_PREFIX: &str = "/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Returns `None` for a blank token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Identity collaborator: hands out the credential for each outgoing call.
pub trait CredentialSource: Send + Sync {
    fn bearer(&self) -> Option<BearerToken>;
}

/// A credential fixed at construction time.
#[derive(Clone, Debug, Default)]
pub struct StaticCredential(Option<BearerToken>);

impl StaticCredential {
    #[must_use]
    pub fn new(token: Option<BearerToken>) -> Self {
        Self(token)
    }
}

impl CredentialSource for StaticCredential {
    fn bearer(&self) -> Option<BearerToken> {
        self.0.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<BearerToken>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Reads `GRAMMAR_API_URL`, `GRAMMAR_API_TOKEN` and `GRAMMAR_API_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("GRAMMAR_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(|| DEFAULT_BASE_URL.to_string(), |url| normalize_base_url(&url));
        let token = env::var("GRAMMAR_API_TOKEN").ok().and_then(BearerToken::new);
        let timeout = env::var("GRAMMAR_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);
        Self {
            base_url,
            token,
            timeout,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<BearerToken>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Trims trailing slashes and appends `/api/v1` when missing.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with(API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_PREFIX}")
    }
}
