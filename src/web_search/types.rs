//! Search result, query and response envelope types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SearchError;
use crate::renderer::Record;

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<String>>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Extracted fields with no dedicated slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SearchResult {
    /// Map an extracted record. Records without a `url` are not results.
    #[must_use]
    pub fn from_record(mut record: Record) -> Option<Self> {
        let url = take_string(&mut record, "url")?;
        let title = take_string(&mut record, "title").unwrap_or_default();

        let summary = take_string(&mut record, "summary");
        let site_name = take_string(&mut record, "site_name");
        let publish_date = take_string(&mut record, "publish_date");
        let image_url = take_string(&mut record, "image_url");
        let video_url = take_string(&mut record, "video_url");
        let source_type = take_string(&mut record, "source_type");
        let thumbnails = record.remove("thumbnails").and_then(|value| match value {
            Value::String(s) if !s.is_empty() => Some(vec![s]),
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => None,
        });
        let duration = record.remove("duration").and_then(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => parse_duration(&s),
            _ => None,
        });

        Some(Self {
            title,
            url,
            summary,
            site_name,
            publish_date,
            image_url,
            video_url,
            thumbnails,
            duration,
            source_type,
            metadata: (!record.is_empty()).then_some(record),
        })
    }
}

fn take_string(record: &mut Record, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) => {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Seconds from `"125"`, `"2:05"` or `"1:02:05"`
fn parse_duration(raw: &str) -> Option<u64> {
    raw.trim()
        .split(':')
        .try_fold(0u64, |total, part| {
            let part = part.trim().parse::<u64>().ok()?;
            total.checked_mul(60)?.checked_add(part)
        })
}

fn default_page() -> usize {
    1
}

fn default_count() -> usize {
    10
}

/// Public query surface: provider, keyword, page (default 1) and count (default 10)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub provider: String,
    #[serde(alias = "kw")]
    pub keyword: String,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_count", alias = "number")]
    pub count: usize,
}

impl SearchQuery {
    pub fn new(provider: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            keyword: keyword.into(),
            page: default_page(),
            count: default_count(),
        }
    }

    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Response envelope handed to the HTTP layer
///
/// Success: `{"code": 200, "data": ...}`. Failure: `{"code": N, "data": null, "message": ..., "detail"?: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            data: Some(data),
            message: None,
            detail: None,
        }
    }

    pub fn failure(code: u16, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            code,
            data: None,
            message: Some(message.into()),
            detail,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == 200
    }
}

impl ApiResponse<Vec<SearchResult>> {
    /// Envelope for a search outcome; an empty result list is a success
    #[must_use]
    pub fn from_search(outcome: Result<Vec<SearchResult>, SearchError>) -> Self {
        match outcome {
            Ok(results) => Self::success(results),
            Err(e) => {
                let detail = std::error::Error::source(&e).map(ToString::to_string);
                Self::failure(e.status_code(), e.to_string(), detail)
            }
        }
    }
}
