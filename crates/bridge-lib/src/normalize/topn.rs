//! Top-N consumers normalizer
//!
//! The raw response is a flat list of resource stat groups keyed by
//! resource id. Groups are re-grouped preserving first-seen order; rank
//! is the 1-based position in that input order, and any re-sorting by
//! value is the caller's job. Display names resolve through the side
//! table produced during request augmentation, since the raw response
//! identifies resources only by id.

use super::{coerce_number, page_info, str_field, NormalizeContext};
use crate::models::{TopNEntry, TopNReport};
use crate::units::detect_unit;
use serde_json::Value;

/// Per-stat reduction over one group's samples
struct StatRollup {
    average: Option<f64>,
    latest: Option<f64>,
}

fn roll_up(stat: &Value) -> StatRollup {
    let data = stat
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let valid: Vec<f64> = data.iter().filter_map(coerce_number).collect();
    let average = if valid.is_empty() {
        None
    } else {
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    };
    // Latest is the literal last slot; a null there falls back to the
    // average when the representative value is picked
    StatRollup {
        average,
        latest: data.last().and_then(coerce_number),
    }
}

fn stat_key(stat: &Value) -> Option<String> {
    match stat.get("statKey") {
        Some(Value::Object(_)) => stat.get("statKey").and_then(|k| str_field(k, "key")),
        Some(Value::String(key)) => Some(key.clone()),
        _ => None,
    }
}

/// Normalize a top-N response
pub fn normalize_top_n(raw: &Value, context: &NormalizeContext) -> TopNReport {
    let groups = raw
        .get("values")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    // Group by resource id, preserving first-seen order
    let mut ordered: Vec<(String, Vec<&Value>)> = Vec::new();
    for group in groups {
        let Some(resource_id) = str_field(group, "resourceId") else {
            continue;
        };
        let stats: Vec<&Value> = group
            .get("stat-list")
            .and_then(|list| list.get("stat"))
            .and_then(Value::as_array)
            .map(|stats| stats.iter().collect())
            .unwrap_or_default();
        match ordered.iter_mut().find(|(id, _)| *id == resource_id) {
            Some((_, existing)) => existing.extend(stats),
            None => ordered.push((resource_id, stats)),
        }
    }

    let mut entries = Vec::new();
    for (rank, (resource_id, stats)) in ordered.iter().enumerate() {
        let name = context
            .names
            .and_then(|names| names.get(resource_id))
            .cloned()
            .unwrap_or_else(|| resource_id.clone());

        for stat in stats {
            let Some(key) = stat_key(stat) else {
                continue;
            };
            let rollup = roll_up(stat);
            entries.push(TopNEntry {
                rank: rank as u64 + 1,
                resource_id: resource_id.clone(),
                name: name.clone(),
                unit: detect_unit(&key).to_string(),
                stat_key: key,
                value: rollup.latest.or(rollup.average),
                average: rollup.average,
                latest: rollup.latest,
            });
        }
    }

    TopNReport {
        total_count: entries.len() as u64,
        entries,
        page_info: page_info(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::NameTable;
    use serde_json::json;

    fn group(resource_id: &str, data: Value) -> Value {
        json!({
            "resourceId": resource_id,
            "stat-list": {
                "stat": [{
                    "statKey": {"key": "cpu|usage_average"},
                    "timestamps": [1000, 2000, 3000],
                    "data": data
                }]
            }
        })
    }

    #[test]
    fn ranks_follow_input_group_order() {
        let raw = json!({"values": [
            group("r1", json!([10.0, 20.0])),
            group("r2", json!([90.0, 80.0])),
        ]});
        let report = normalize_top_n(&raw, &NormalizeContext::default());
        assert_eq!(report.total_count, 2);
        assert_eq!(report.entries[0].rank, 1);
        assert_eq!(report.entries[0].resource_id, "r1");
        assert_eq!(report.entries[1].rank, 2);
    }

    #[test]
    fn representative_value_is_last_sample() {
        let raw = json!({"values": [group("r1", json!([10.0, 20.0, 30.0]))]});
        let report = normalize_top_n(&raw, &NormalizeContext::default());
        let entry = &report.entries[0];
        assert_eq!(entry.latest, Some(30.0));
        assert_eq!(entry.average, Some(20.0));
        assert_eq!(entry.value, Some(30.0));
        assert_eq!(entry.unit, "%");
    }

    #[test]
    fn value_falls_back_to_average_when_last_sample_is_null() {
        let raw = json!({"values": [group("r1", json!([10.0, 20.0, null]))]});
        let report = normalize_top_n(&raw, &NormalizeContext::default());
        let entry = &report.entries[0];
        assert_eq!(entry.latest, None);
        assert_eq!(entry.average, Some(15.0));
        assert_eq!(entry.value, Some(15.0));
    }

    #[test]
    fn all_invalid_samples_leave_value_none() {
        let raw = json!({"values": [group("r1", json!([null, "x"]))]});
        let report = normalize_top_n(&raw, &NormalizeContext::default());
        assert_eq!(report.entries[0].value, None);
        assert_eq!(report.entries[0].average, None);
    }

    #[test]
    fn duplicate_groups_merge_under_first_seen_rank() {
        let raw = json!({"values": [
            group("r1", json!([1.0])),
            group("r2", json!([2.0])),
            group("r1", json!([3.0])),
        ]});
        let report = normalize_top_n(&raw, &NormalizeContext::default());
        // r1 contributes two entries, both at rank 1
        let r1_ranks: Vec<u64> = report
            .entries
            .iter()
            .filter(|e| e.resource_id == "r1")
            .map(|e| e.rank)
            .collect();
        assert_eq!(r1_ranks, vec![1, 1]);
    }

    #[test]
    fn names_resolve_through_side_table() {
        let mut names = NameTable::new();
        names.insert("r1".to_string(), "web-01".to_string());
        let context = NormalizeContext {
            request: None,
            names: Some(&names),
        };
        let raw = json!({"values": [
            group("r1", json!([5.0])),
            group("r2", json!([6.0])),
        ]});
        let report = normalize_top_n(&raw, &context);
        assert_eq!(report.entries[0].name, "web-01");
        // Unknown ids fall back to the raw id
        assert_eq!(report.entries[1].name, "r2");
    }

    #[test]
    fn zero_shape_on_missing_values() {
        let report = normalize_top_n(&json!({}), &NormalizeContext::default());
        assert_eq!(report.total_count, 0);
        assert!(report.entries.is_empty());
    }
}
