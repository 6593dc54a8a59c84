//! Time-series and latest-stats normalizers
//!
//! Both families share the monitoring API's nested
//! `values[] -> stat-list -> stat[]` layout, where each stat carries
//! parallel `timestamps` and `data` arrays. Zipping always stops at the
//! shorter array; a length mismatch never indexes out of bounds.

use super::{coerce_number, coerce_timestamp, page_info, str_field};
use crate::models::{LatestStatRecord, LatestStatsReport, MetricSample, MetricsReport, Summary};
use crate::units::{detect_unit, format_value};
use serde_json::Value;

/// Stat key from a stat entry; tolerates both the `{"key": ...}` object
/// form and a bare string
fn stat_key(stat: &Value) -> Option<String> {
    match stat.get("statKey") {
        Some(Value::Object(_)) => str_field(stat.get("statKey")?, "key"),
        Some(Value::String(key)) => Some(key.clone()),
        _ => None,
    }
}

fn stat_entries(resource: &Value) -> &[Value] {
    resource
        .get("stat-list")
        .and_then(|list| list.get("stat"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Zip a stat's timestamp and data arrays into samples, shortest wins
fn zip_samples(stat: &Value, unit: &str) -> Vec<MetricSample> {
    let timestamps = stat
        .get("timestamps")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let data = stat
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    timestamps
        .iter()
        .zip(data.iter())
        .filter_map(|(ts, value)| {
            Some(MetricSample {
                timestamp: coerce_timestamp(ts)?,
                value: coerce_number(value),
                unit: unit.to_string(),
            })
        })
        .collect()
}

/// Normalize a time-series response around its first stat tuple
///
/// Samples are re-sorted ascending by timestamp; the input order is not
/// trusted.
pub fn normalize_metrics(raw: &Value) -> MetricsReport {
    let resources = raw
        .get("values")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for resource in resources {
        let resource_id = str_field(resource, "resourceId");
        for stat in stat_entries(resource) {
            let Some(key) = stat_key(stat) else {
                continue;
            };
            let unit = detect_unit(&key);
            let mut samples = zip_samples(stat, unit);
            samples.sort_by_key(|s| s.timestamp);
            let summary = Summary::from_samples(&samples);

            return MetricsReport {
                resource_id,
                stat_key: Some(key),
                unit: unit.to_string(),
                total_count: samples.len() as u64,
                samples,
                summary: Some(summary),
                page_info: page_info(raw),
            };
        }
    }

    MetricsReport::default()
}

/// Normalize a latest-stats response into one flat row per stat
///
/// Each stat carries a single sample; the report-level summary rolls up
/// every row's value across resources.
pub fn normalize_latest_stats(raw: &Value) -> LatestStatsReport {
    let resources = raw
        .get("values")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut records = Vec::new();
    for resource in resources {
        let resource_id = str_field(resource, "resourceId");
        for stat in stat_entries(resource) {
            let Some(key) = stat_key(stat) else {
                continue;
            };
            let unit = detect_unit(&key);
            let sample = zip_samples(stat, unit).into_iter().next();
            let (timestamp, value) = match sample {
                Some(sample) => (Some(sample.timestamp), sample.value),
                None => (None, None),
            };
            records.push(LatestStatRecord {
                resource_id: resource_id.clone(),
                formatted: format_value(value, &key),
                stat_key: key,
                timestamp,
                value,
                unit: unit.to_string(),
            });
        }
    }

    let samples: Vec<MetricSample> = records
        .iter()
        .filter_map(|record| {
            Some(MetricSample {
                timestamp: record.timestamp?,
                value: record.value,
                unit: record.unit.clone(),
            })
        })
        .collect();
    let summary = if samples.is_empty() {
        None
    } else {
        Some(Summary::from_samples(&samples))
    };

    LatestStatsReport {
        total_count: records.len() as u64,
        records,
        summary,
        page_info: page_info(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats_body(timestamps: Value, data: Value) -> Value {
        json!({
            "values": [{
                "resourceId": "vm-1",
                "stat-list": {
                    "stat": [{
                        "statKey": {"key": "cpu|usage_average"},
                        "timestamps": timestamps,
                        "data": data
                    }]
                }
            }]
        })
    }

    #[test]
    fn metrics_zero_shape_on_missing_values() {
        let report = normalize_metrics(&json!({}));
        assert_eq!(report.total_count, 0);
        assert!(report.samples.is_empty());
        assert_eq!(report.summary, None);
    }

    #[test]
    fn metrics_zips_to_shorter_length() {
        let raw = stats_body(json!([1000, 2000, 3000]), json!([10.0, 20.0]));
        let report = normalize_metrics(&raw);
        assert_eq!(report.total_count, 2);
        assert_eq!(report.resource_id.as_deref(), Some("vm-1"));
        assert_eq!(report.stat_key.as_deref(), Some("cpu|usage_average"));
        assert_eq!(report.unit, "%");
    }

    #[test]
    fn metrics_resorts_by_timestamp() {
        let raw = stats_body(json!([3000, 1000, 2000]), json!([30.0, 10.0, 20.0]));
        let report = normalize_metrics(&raw);
        let timestamps: Vec<i64> = report.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 2000, 3000]);
        let summary = report.summary.unwrap();
        assert_eq!(summary.latest, Some(30.0));
        assert_eq!(summary.latest_timestamp, Some(3000));
    }

    #[test]
    fn metrics_summary_skips_invalid_values() {
        let raw = stats_body(
            json!([1000, 2000, 3000, 4000]),
            json!([10.0, null, "bogus", 30.0]),
        );
        let report = normalize_metrics(&raw);
        assert_eq!(report.total_count, 4);
        let summary = report.summary.unwrap();
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(30.0));
        assert_eq!(summary.avg, Some(20.0));
    }

    #[test]
    fn metrics_all_invalid_gives_null_summary_fields() {
        let raw = stats_body(json!([1000, 2000]), json!([null, "x"]));
        let report = normalize_metrics(&raw);
        let summary = report.summary.unwrap();
        assert_eq!(summary.min, None);
        assert_eq!(summary.avg, None);
        assert_eq!(summary.latest, None);
    }

    #[test]
    fn metrics_normalization_is_idempotent() {
        let raw = stats_body(json!([2000, 1000]), json!([5.0, "7"]));
        assert_eq!(normalize_metrics(&raw), normalize_metrics(&raw));
    }

    #[test]
    fn latest_stats_flattens_multiple_resources() {
        let raw = json!({
            "values": [
                {
                    "resourceId": "vm-1",
                    "stat-list": {"stat": [
                        {"statKey": {"key": "cpu|usage_average"}, "timestamps": [1000], "data": [50.0]},
                        {"statKey": {"key": "mem|consumed_average"}, "timestamps": [1000], "data": [2048.0]}
                    ]}
                },
                {
                    "resourceId": "vm-2",
                    "stat-list": {"stat": [
                        {"statKey": {"key": "cpu|usage_average"}, "timestamps": [1000], "data": [70.0]}
                    ]}
                }
            ]
        });
        let report = normalize_latest_stats(&raw);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.records[1].formatted, "2.00 MB");
        let summary = report.summary.unwrap();
        assert_eq!(summary.max, Some(2048.0));
    }

    #[test]
    fn latest_stats_zero_shape_on_missing_values() {
        let report = normalize_latest_stats(&json!({"unexpected": true}));
        assert_eq!(report.total_count, 0);
        assert!(report.records.is_empty());
        assert_eq!(report.summary, None);
    }
}
