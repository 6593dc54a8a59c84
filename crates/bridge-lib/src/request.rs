//! Request synthesis from language-model output
//!
//! The model is only ever asked to emit a monitoring-API path (optionally
//! as a full URL), never a verb or a body. Synthesis extracts a
//! `RequestDescriptor` from that text or rejects it outright; any parse
//! ambiguity yields `None`, never a partially-populated descriptor.
//! The top-N family additionally goes through an augmentation pass that
//! injects the full resource enumeration as selector parameters.

use crate::executor::{fetch_resource_inventory, RequestExecutor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

/// Path prefix the external host wraps the API under; downstream
/// execution must never see it
pub const SUITE_PREFIX: &str = "/suite-api";

/// Path marker of the top-N consumers endpoint family
const TOP_N_MARKER: &str = "/stats/topn";

/// Resource-selector query parameter injected during augmentation
const RESOURCE_SELECTOR_PARAM: &str = "resourceId";

/// Side table mapping resource id to display name, produced by the
/// augmentation pass for the top-N normalizer
pub type NameTable = HashMap<String, String>;

/// HTTP verb of a synthesized request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

/// A query parameter value; repeated keys collapse into `Many`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(existing) => {
                let first = std::mem::take(existing);
                *self = QueryValue::Many(vec![first, value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }

    /// All values in insertion order
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::One(v) => vec![v.as_str()],
            QueryValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// Insertion-ordered query parameter map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append a value, merging with (never discarding) any values already
    /// present under the same key
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.0.iter_mut().find(|(k, _)| *k == key) {
            existing.push(value);
        } else {
            self.0.push((key, QueryValue::One(value)));
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// All values recorded under `key`, empty when absent
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.get(key).map(QueryValue::values).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Re-encode as a query string; multi-values repeat the key
    pub fn to_query_string(&self) -> String {
        let mut encoded = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            for v in value.values() {
                encoded.append_pair(key, v);
            }
        }
        encoded.finish()
    }
}

/// Structured, executable representation of a monitoring-API call
///
/// `endpoint_path` always starts with `/` and never carries a scheme,
/// host, or the `/suite-api` prefix. The descriptor is immutable once
/// augmentation has completed or been skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub endpoint_path: String,
    pub method: HttpMethod,
    pub query: QueryParams,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(endpoint_path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint_path: endpoint_path.into(),
            method,
            query: QueryParams::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }
}

/// Synthesize a request descriptor from raw model text
///
/// Only the first line is considered. A full URL keeps path + query; a
/// bare path must start with `/`. The `/suite-api` prefix is stripped.
/// Returns `None` for anything unusable, meaning "no monitoring call
/// should be made".
pub fn synthesize(raw_text: &str) -> Option<RequestDescriptor> {
    let line = raw_text.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let path_and_query = if line.starts_with("http://") || line.starts_with("https://") {
        let url = match Url::parse(line) {
            Ok(url) => url,
            Err(error) => {
                debug!(%error, "Model output looked like a URL but failed to parse");
                return None;
            }
        };
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        }
    } else {
        line.to_string()
    };

    if !path_and_query.starts_with('/') {
        debug!(output = %line, "Model output is not an API path");
        return None;
    }

    let (path, query_string) = match path_and_query.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (path_and_query, String::new()),
    };

    let mut query = QueryParams::new();
    for (key, value) in url::form_urlencoded::parse(query_string.as_bytes()) {
        query.push(key.into_owned(), value.into_owned());
    }

    Some(RequestDescriptor {
        endpoint_path: strip_suite_prefix(&path),
        method: HttpMethod::Get,
        query,
        body: None,
    })
}

fn strip_suite_prefix(path: &str) -> String {
    match path.strip_prefix(SUITE_PREFIX) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

/// Augment a top-N request with the full resource enumeration
///
/// Non-top-N requests pass through untouched. Enumeration ids are
/// appended to any `resourceId` values the model already supplied;
/// existing ids are preserved even when the enumeration repeats them.
/// An enumeration failure degrades to "no augmentation" rather than
/// failing request construction. The returned side table maps resource
/// id to display name for the top-N normalizer, since the raw top-N
/// response identifies resources only by id.
pub async fn augment_top_n(
    mut request: RequestDescriptor,
    executor: &dyn RequestExecutor,
) -> (RequestDescriptor, NameTable) {
    if !request.endpoint_path.contains(TOP_N_MARKER) {
        return (request, NameTable::new());
    }

    let inventory = match fetch_resource_inventory(executor).await {
        Ok(inventory) => inventory,
        Err(error) => {
            warn!(%error, "Resource enumeration failed; top-N request left unaugmented");
            return (request, NameTable::new());
        }
    };

    let mut names = NameTable::new();
    for resource in &inventory {
        if let Some(name) = &resource.name {
            names.insert(resource.identifier.clone(), name.clone());
        }
        request
            .query
            .push(RESOURCE_SELECTOR_PARAM, resource.identifier.clone());
    }

    info!(
        injected = inventory.len(),
        path = %request.endpoint_path,
        "Augmented top-N request with resource enumeration"
    );
    (request, names)
}
