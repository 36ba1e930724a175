//! Per-resource record tables and the query pipeline.

use cometsync_protocol::{loose_eq, normalized, Params, ResultPage};
use serde_json::{json, Value};
use std::cmp::Ordering;

/// Reserved query keys the pipeline consumes; everything else is a
/// field-equality filter.
const RESERVED: &[&str] = &[
    "limit",
    "offset",
    "page",
    "orderBy",
    "orderDirection",
    "search",
    "includes",
    "__client_time",
];

/// A parsed collection query.
///
/// Values arrive as native JSON over the realtime channel but as strings
/// over a query string, so numeric fields are coerced loosely.
#[derive(Debug, Clone)]
pub(crate) struct QuerySpec {
    pub(crate) limit: Option<u64>,
    pub(crate) offset: u64,
    pub(crate) page: Option<u64>,
    pub(crate) order_by: Option<String>,
    pub(crate) descending: bool,
    pub(crate) search: Option<String>,
    pub(crate) filters: Params,
}

impl QuerySpec {
    pub(crate) fn from_params(params: &Params, default_limit: u64) -> Self {
        let filters = params
            .iter()
            .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            limit: match params.get("limit") {
                Some(value) => as_u64_loose(value),
                None => Some(default_limit),
            },
            offset: params.get("offset").and_then(as_u64_loose).unwrap_or(0),
            page: params.get("page").and_then(as_u64_loose),
            order_by: params
                .get("orderBy")
                .map(normalized)
                .filter(|s| !s.is_empty()),
            descending: params
                .get("orderDirection")
                .map(|v| normalized(v).eq_ignore_ascii_case("desc"))
                .unwrap_or(false),
            search: params
                .get("search")
                .map(normalized)
                .filter(|s| !s.is_empty()),
            filters,
        }
    }
}

/// Loose numeric coercion: numbers or numeric strings.
fn as_u64_loose(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn cmp_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let x = a.map(normalized).unwrap_or_default();
            let y = b.map(normalized).unwrap_or_default();
            x.cmp(&y)
        }
    }
}

/// Records of one resource.
#[derive(Debug, Default)]
pub(crate) struct ResourceTable {
    records: Vec<Params>,
    next_id: u64,
}

impl ResourceTable {
    pub(crate) fn seed(&mut self, records: Vec<Params>) {
        for record in records {
            let id = record.get("id").and_then(as_u64_loose).unwrap_or(0);
            self.next_id = self.next_id.max(id);
            self.records.push(record);
        }
    }

    pub(crate) fn records(&self) -> &[Params] {
        &self.records
    }

    pub(crate) fn find(&self, id: &Value) -> Option<&Params> {
        self.records
            .iter()
            .find(|record| record.get("id").is_some_and(|v| loose_eq(v, id)))
    }

    /// Inserts a record, assigning the next numeric id when the payload
    /// carries none.
    pub(crate) fn create(&mut self, mut record: Params) -> Params {
        record.remove("__client_time");
        if !record.get("id").is_some_and(|v| !v.is_null()) {
            self.next_id += 1;
            record.insert("id".into(), json!(self.next_id));
        } else if let Some(id) = record.get("id").and_then(as_u64_loose) {
            self.next_id = self.next_id.max(id);
        }
        self.records.push(record.clone());
        record
    }

    /// Merges the delta into the record with the given id.
    pub(crate) fn update(&mut self, id: &Value, delta: &Params) -> Option<Params> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.get("id").is_some_and(|v| loose_eq(v, id)))?;
        for (key, value) in delta {
            if key == "__client_time" {
                continue;
            }
            record.insert(key.clone(), value.clone());
        }
        Some(record.clone())
    }

    /// Removes and returns the record with the given id.
    pub(crate) fn destroy(&mut self, id: &Value) -> Option<Params> {
        let index = self
            .records
            .iter()
            .position(|record| record.get("id").is_some_and(|v| loose_eq(v, id)))?;
        Some(self.records.remove(index))
    }

    /// Runs the query pipeline: filter, search, sort, slice.
    ///
    /// `recordCount` is the filtered total across all pages.
    pub(crate) fn query(&self, spec: &QuerySpec) -> ResultPage {
        let mut matches: Vec<&Params> = self
            .records
            .iter()
            .filter(|record| {
                spec.filters.iter().all(|(key, expected)| {
                    record.get(key).is_some_and(|actual| loose_eq(actual, expected))
                })
            })
            .filter(|record| match &spec.search {
                Some(term) => {
                    let needle = term.to_lowercase();
                    record.values().any(|value| match value {
                        Value::String(s) => s.to_lowercase().contains(&needle),
                        _ => false,
                    })
                }
                None => true,
            })
            .collect();

        if let Some(order_by) = &spec.order_by {
            matches.sort_by(|a, b| cmp_fields(a.get(order_by), b.get(order_by)));
            if spec.descending {
                matches.reverse();
            }
        }

        let record_count = matches.len() as u64;
        let offset = spec.offset.min(record_count) as usize;
        let sliced: Vec<Value> = match spec.limit {
            Some(limit) => matches
                .iter()
                .skip(offset)
                .take(limit as usize)
                .map(|record| Value::Object((*record).clone()))
                .collect(),
            None => matches
                .iter()
                .skip(offset)
                .map(|record| Value::Object((*record).clone()))
                .collect(),
        };

        let page = spec.page.or_else(|| match spec.limit {
            Some(limit) if limit > 0 => Some(spec.offset / limit + 1),
            _ => None,
        });

        ResultPage {
            data: sliced,
            record_count,
            page,
            pages: None,
            limit: None,
        }
    }
}
