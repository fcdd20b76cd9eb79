//! Query descriptor: the tuple that defines the requested view of history.
//! 查询描述符：过滤、搜索、偏移和页大小。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clip::ContentType;

/// Content-type filter. `All` travels on the wire as the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FilterType {
    #[default]
    All,
    Only(ContentType),
}

impl FilterType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            FilterType::All => "",
            FilterType::Only(ct) => ct.as_str(),
        }
    }

    pub fn matches(&self, content_type: ContentType) -> bool {
        match self {
            FilterType::All => true,
            FilterType::Only(ct) => *ct == content_type,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::All => f.write_str("all"),
            FilterType::Only(ct) => write!(f, "{}", ct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterParseError {
    #[error("unknown filter type: {0:?}")]
    Unknown(String),
}

impl FromStr for FilterType {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(FilterType::All);
        }
        s.parse::<ContentType>()
            .map(FilterType::Only)
            .map_err(|_| FilterParseError::Unknown(s.to_string()))
    }
}

impl From<FilterType> for String {
    fn from(filter: FilterType) -> Self {
        filter.as_wire().to_string()
    }
}

impl TryFrom<String> for FilterType {
    type Error = FilterParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A filter choice offered by the panel header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub label: &'static str,
    pub filter: FilterType,
}

impl FilterChip {
    pub const ALL: [FilterChip; 6] = [
        FilterChip { label: "All Types", filter: FilterType::All },
        FilterChip { label: "Text", filter: FilterType::Only(ContentType::Text) },
        FilterChip { label: "HTML", filter: FilterType::Only(ContentType::Html) },
        FilterChip { label: "Colors", filter: FilterType::Only(ContentType::Color) },
        FilterChip { label: "Images", filter: FilterType::Only(ContentType::Image) },
        FilterChip { label: "Files", filter: FilterType::Only(ContentType::Files) },
    ];
}

/// `(filter, search)`: the descriptor without paging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryShape {
    pub filter_type: FilterType,
    pub search_query: String,
}

/// Immutable value describing the requested page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub filter_type: FilterType,
    pub search_query: String,
    pub offset: usize,
    pub limit: usize,
}

impl QueryDescriptor {
    pub fn first_page(limit: usize) -> Self {
        Self {
            filter_type: FilterType::All,
            search_query: String::new(),
            offset: 0,
            limit: limit.max(1),
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.search_query.is_empty()
    }

    pub fn shape(&self) -> QueryShape {
        QueryShape {
            filter_type: self.filter_type,
            search_query: self.search_query.clone(),
        }
    }

    pub fn with_filter(&self, filter_type: FilterType) -> Self {
        Self {
            filter_type,
            offset: 0,
            ..self.clone()
        }
    }

    /// Whitespace-only text is treated as "no search".
    pub fn with_search(&self, text: &str) -> Self {
        let search_query = if text.trim().is_empty() {
            String::new()
        } else {
            text.to_string()
        };
        Self {
            search_query,
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// The descriptor actually sent to the service. Search results are not
    /// paginated, so a search asks for the first `search_limit` matches.
    pub fn request(&self, search_limit: usize) -> Self {
        if self.is_searching() {
            Self {
                offset: 0,
                limit: search_limit.max(1),
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    /// Clamp a requested offset to a valid page start.
    ///
    /// Negative values become 0, values are aligned down to a page boundary,
    /// and anything at or past `total_count` lands on the last page start.
    pub fn clamp_offset(&self, requested: i64, total_count: Option<u64>) -> usize {
        if requested <= 0 {
            return 0;
        }
        let limit = self.limit.max(1) as u64;
        let mut offset = (requested as u64 / limit) * limit;
        if let Some(total) = total_count {
            let last_start = total.saturating_sub(1) / limit * limit;
            offset = offset.min(last_start);
        }
        offset as usize
    }
}
