//! Paged query results.

use crate::Params;
use serde_json::{json, Value};

/// One page of a resource query as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    /// Records in this page.
    pub data: Vec<Value>,
    /// Server-reported total number of records matching the current
    /// filter, across all pages.
    pub record_count: u64,
    /// 1-based page number, when the server reports one.
    pub page: Option<u64>,
    /// Server-supplied page count; derived from `record_count` when
    /// absent.
    pub pages: Option<u64>,
    /// Server-side page size override.
    pub limit: Option<u64>,
}

impl ResultPage {
    /// An empty page.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            record_count: 0,
            page: None,
            pages: None,
            limit: None,
        }
    }

    /// Reads a page out of a response body.
    ///
    /// Absent or malformed fields degrade to the empty page rather than
    /// failing; the merge layer treats them as "server said nothing".
    pub fn from_body(body: &Params) -> Self {
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self {
            data,
            record_count: body.get("recordCount").and_then(Value::as_u64).unwrap_or(0),
            page: body.get("page").and_then(Value::as_u64),
            pages: body.get("pages").and_then(Value::as_u64),
            limit: body.get("limit").and_then(Value::as_u64),
        }
    }

    /// Serializes the page into the response-body shape.
    pub fn to_body(&self) -> Params {
        let mut body = Params::new();
        body.insert("data".into(), Value::Array(self.data.clone()));
        body.insert("recordCount".into(), json!(self.record_count));
        if let Some(page) = self.page {
            body.insert("page".into(), json!(page));
        }
        if let Some(pages) = self.pages {
            body.insert("pages".into(), json!(pages));
        }
        if let Some(limit) = self.limit {
            body.insert("limit".into(), json!(limit));
        }
        body
    }
}

/// Number of pages needed for `record_count` records at `limit` per page.
pub fn page_count(record_count: u64, limit: u64) -> u64 {
    if record_count == 0 || limit == 0 {
        0
    } else {
        record_count.div_ceil(limit)
    }
}
