use grammar_core::model::Module;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::repository::{ModulePage, StorageError};

pub(crate) fn network(e: reqwest::Error) -> StorageError {
    StorageError::Network(e.to_string())
}

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Error bodies come as `{"detail": ...}` or `{"message": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let detail = parsed.and_then(|b| {
        b.detail
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .or(b.message)
    });
    detail.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    })
}

pub(crate) fn map_status(status: StatusCode, body: &str) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthorized,
        _ => StorageError::Http {
            status: status.as_u16(),
            message: error_message(status, body),
        },
    }
}

/// Login pages and proxies answer with HTML where JSON is expected.
pub(crate) fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<!DOCTYPE") || head.starts_with("<html") || head.starts_with("<HTML")
}

/// The catalog answers with either a bare array or a paginated object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ModulesResponse {
    List(Vec<Module>),
    Page {
        #[serde(default)]
        data: Vec<Module>,
        total: Option<u32>,
    },
}

impl ModulesResponse {
    pub(crate) fn into_page(self) -> ModulePage {
        match self {
            ModulesResponse::List(modules) => {
                let total = u32::try_from(modules.len()).unwrap_or(u32::MAX);
                ModulePage { modules, total }
            }
            ModulesResponse::Page { data, total } => {
                let total = total
                    .filter(|t| *t > 0)
                    .unwrap_or_else(|| u32::try_from(data.len()).unwrap_or(u32::MAX));
                ModulePage {
                    modules: data,
                    total,
                }
            }
        }
    }
}
