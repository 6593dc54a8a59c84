//! Response normalizers
//!
//! One pure, total function per response type tag. Every normalizer
//! degrades to its tag's zero-value shape (`total_count == 0`, empty
//! sequence, no summary) when the expected structure is absent; none of
//! them panics or returns an error, since a monitoring outage must not
//! crash the narrative answer shown to the user.

mod alerts;
mod catalog;
mod inventory;
mod metrics;
mod topn;

pub use alerts::{normalize_alerts, normalize_symptoms};
pub use catalog::{normalize_properties, normalize_stat_keys};
pub use inventory::{normalize_relationships, normalize_resource_detail, normalize_resources};
pub use metrics::{normalize_latest_stats, normalize_metrics};
pub use topn::normalize_top_n;

use crate::classify::ResponseTypeTag;
use crate::models::{NormalizedModel, PageInfo};
use crate::request::{NameTable, RequestDescriptor};
use serde_json::Value;

/// Category sentinel for keys without a pipe delimiter
pub const DEFAULT_CATEGORY: &str = "General";

/// Per-invocation context handed to the normalizers
///
/// Carries the originating descriptor and the id-to-name side table the
/// augmentation pass produced. Both are optional; normalizers fall back
/// to raw identifiers when they are absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeContext<'a> {
    pub request: Option<&'a RequestDescriptor>,
    pub names: Option<&'a NameTable>,
}

/// Dispatch a raw monitoring response to the normalizer for its tag
pub fn normalize(tag: ResponseTypeTag, raw: &Value, context: &NormalizeContext) -> NormalizedModel {
    match tag {
        ResponseTypeTag::Metrics => NormalizedModel::Metrics(normalize_metrics(raw)),
        ResponseTypeTag::LatestStats => NormalizedModel::LatestStats(normalize_latest_stats(raw)),
        ResponseTypeTag::TopN => NormalizedModel::TopN(normalize_top_n(raw, context)),
        ResponseTypeTag::Alerts => NormalizedModel::Alerts(normalize_alerts(raw)),
        ResponseTypeTag::Symptoms => NormalizedModel::Symptoms(normalize_symptoms(raw)),
        ResponseTypeTag::Properties => NormalizedModel::Properties(normalize_properties(raw)),
        ResponseTypeTag::StatKeys => NormalizedModel::StatKeys(normalize_stat_keys(raw)),
        ResponseTypeTag::Resources => NormalizedModel::Resources(normalize_resources(raw)),
        ResponseTypeTag::ResourceDetail => {
            NormalizedModel::ResourceDetail(normalize_resource_detail(raw))
        }
        ResponseTypeTag::Relationships => {
            NormalizedModel::Relationships(normalize_relationships(raw))
        }
        ResponseTypeTag::Unknown => NormalizedModel::Unknown(raw.clone()),
    }
}

/// Coerce a raw sample value to a number
///
/// The monitoring API emits plain numbers, numeric strings, and
/// `{"value": ...}` wrapper objects interchangeably; everything else
/// (including non-finite results) coerces to `None`.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Object(map) => map.get("value").and_then(coerce_number),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Epoch-millisecond timestamp from a raw slot (number or numeric string)
pub(crate) fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// String field lookup defaulting to `None`
pub(crate) fn str_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Split a pipe-delimited key on the first `|` into `(category, name)`
///
/// A key without a delimiter lands in the default category with the
/// whole string as its name.
pub(crate) fn split_category(key: &str) -> (String, String) {
    match key.split_once('|') {
        Some((category, rest)) if !category.is_empty() => {
            (category.to_string(), rest.to_string())
        }
        _ => (DEFAULT_CATEGORY.to_string(), key.to_string()),
    }
}

/// Extract paging metadata, when the response carries it
pub(crate) fn page_info(raw: &Value) -> Option<PageInfo> {
    let info = raw.get("pageInfo")?;
    Some(PageInfo {
        page: info.get("page").and_then(Value::as_u64).unwrap_or(0),
        page_size: info.get("pageSize").and_then(Value::as_u64).unwrap_or(0),
        total_count: info.get("totalCount").and_then(Value::as_u64).unwrap_or(0),
    })
}
