use serde::{Deserialize, Serialize};

use crate::model::progress::ProgressStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Order,
    Title,
    Progress,
    LastAccessed,
}

impl SortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Order => "order",
            SortKey::Title => "title",
            SortKey::Progress => "progress",
            SortKey::LastAccessed => "last_accessed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Status filter of the module list; `All` disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    NotStarted,
    InProgress,
    Completed,
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: ProgressStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::NotStarted => status == ProgressStatus::NotStarted,
            StatusFilter::InProgress => status == ProgressStatus::InProgress,
            StatusFilter::Completed => status == ProgressStatus::Completed,
        }
    }

    /// Query value, `None` for `All`.
    #[must_use]
    pub fn as_query(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::NotStarted => Some("not_started"),
            StatusFilter::InProgress => Some("in_progress"),
            StatusFilter::Completed => Some("completed"),
        }
    }
}

/// Parameters of a module catalog request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub sort_by: Option<SortKey>,
    pub sort_direction: Option<SortDirection>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl ModuleQuery {
    /// Query-string pairs in a stable order; blank search is omitted.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            pairs.push(("search", search.to_string()));
        }
        if let Some(status) = self.status.as_query() {
            pairs.push(("status", status.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sort_by", sort_by.as_str().to_string()));
        }
        if let Some(direction) = self.sort_direction {
            pairs.push(("sort_direction", direction.as_str().to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}
