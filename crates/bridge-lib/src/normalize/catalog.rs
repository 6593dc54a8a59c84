//! Property and stat-key catalog normalizers
//!
//! Both split their pipe-delimited keys into `(category, name)` pairs and
//! expose a by-category grouping plus a sorted distinct category list for
//! the presentation layer.

use super::{page_info, split_category, str_field};
use crate::models::{PropertiesReport, PropertyRecord, StatKeyDescriptor, StatKeysReport};
use crate::units::detect_unit;
use serde_json::Value;
use std::collections::BTreeMap;

/// Property values arrive as strings or numbers; both display as text
fn display_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a configuration-properties response
pub fn normalize_properties(raw: &Value) -> PropertiesReport {
    let entries = raw
        .get("property")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<PropertyRecord> = entries
        .iter()
        .filter_map(|entry| {
            let key = str_field(entry, "name")?;
            let (category, name) = split_category(&key);
            Some(PropertyRecord {
                value: display_value(entry.get("value")),
                key,
                category,
                name,
            })
        })
        .collect();

    let mut by_category: BTreeMap<String, Vec<PropertyRecord>> = BTreeMap::new();
    for record in &records {
        by_category
            .entry(record.category.clone())
            .or_default()
            .push(record.clone());
    }
    let categories: Vec<String> = by_category.keys().cloned().collect();

    PropertiesReport {
        total_count: records.len() as u64,
        records,
        by_category,
        categories,
        page_info: page_info(raw),
    }
}

/// Normalize a stat-keys response
pub fn normalize_stat_keys(raw: &Value) -> StatKeysReport {
    let entries = raw
        .get("stat-key")
        .or_else(|| raw.get("statKeys"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<StatKeyDescriptor> = entries
        .iter()
        .filter_map(|entry| {
            let key = str_field(entry, "key")?;
            let (category, fallback_name) = split_category(&key);
            let name = str_field(entry, "name").unwrap_or(fallback_name);
            Some(StatKeyDescriptor {
                unit: detect_unit(&key).to_string(),
                key,
                category,
                name,
            })
        })
        .collect();

    let mut by_category: BTreeMap<String, Vec<StatKeyDescriptor>> = BTreeMap::new();
    for record in &records {
        by_category
            .entry(record.category.clone())
            .or_default()
            .push(record.clone());
    }
    let categories: Vec<String> = by_category.keys().cloned().collect();

    StatKeysReport {
        total_count: records.len() as u64,
        records,
        by_category,
        categories,
        page_info: page_info(raw),
    }
}
