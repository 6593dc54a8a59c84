//! Alert and symptom normalizers
//!
//! Both flatten the raw arrays into presentation-ready records first and
//! derive their breakdown counts by counting the flattened records, so
//! the breakdown can never disagree with the list shown to the user.

use super::{coerce_timestamp, page_info, str_field};
use crate::models::{
    AlertBreakdown, AlertRecord, AlertsReport, SymptomBreakdown, SymptomRecord, SymptomsReport,
};
use serde_json::Value;

fn timestamp_field(object: &Value, key: &str) -> Option<i64> {
    object.get(key).and_then(coerce_timestamp)
}

/// Normalize an alerts response
pub fn normalize_alerts(raw: &Value) -> AlertsReport {
    let entries = raw
        .get("alerts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<AlertRecord> = entries
        .iter()
        .map(|entry| AlertRecord {
            alert_id: str_field(entry, "alertId"),
            definition_name: str_field(entry, "alertDefinitionName"),
            level: str_field(entry, "alertLevel"),
            status: str_field(entry, "status"),
            impact: str_field(entry, "alertImpact"),
            resource_id: str_field(entry, "resourceId"),
            start_time: timestamp_field(entry, "startTimeUTC"),
            update_time: timestamp_field(entry, "updateTimeUTC"),
        })
        .collect();

    // Breakdown counts come from the output records, not the raw input
    let mut summary = AlertBreakdown::default();
    for record in &records {
        if let Some(level) = &record.level {
            *summary.by_level.entry(level.clone()).or_insert(0) += 1;
        }
        if let Some(status) = &record.status {
            *summary.by_status.entry(status.clone()).or_insert(0) += 1;
        }
        if let Some(impact) = &record.impact {
            *summary.by_impact.entry(impact.clone()).or_insert(0) += 1;
        }
    }

    AlertsReport {
        total_count: records.len() as u64,
        records,
        summary,
        page_info: page_info(raw),
    }
}

/// Normalize a symptoms response
pub fn normalize_symptoms(raw: &Value) -> SymptomsReport {
    let entries = raw
        .get("symptom")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<SymptomRecord> = entries
        .iter()
        .map(|entry| SymptomRecord {
            symptom_id: str_field(entry, "id"),
            name: str_field(entry, "statKeyName").or_else(|| str_field(entry, "message")),
            criticality: str_field(entry, "criticality"),
            kpi: entry.get("kpi").and_then(Value::as_bool).unwrap_or(false),
            resource_id: str_field(entry, "resourceId"),
            start_time: timestamp_field(entry, "startTimeUTC"),
        })
        .collect();

    let mut summary = SymptomBreakdown::default();
    for record in &records {
        if let Some(criticality) = &record.criticality {
            *summary.by_criticality.entry(criticality.clone()).or_insert(0) += 1;
        }
        if record.kpi {
            summary.kpi_count += 1;
        } else {
            summary.non_kpi_count += 1;
        }
    }

    SymptomsReport {
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

    #[test]
    fn alerts_zero_shape_on_missing_array() {
        let report = normalize_alerts(&json!({"message": "service unavailable"}));
        assert_eq!(report.total_count, 0);
        assert!(report.records.is_empty());
        assert!(report.summary.by_level.is_empty());
    }

    #[test]
    fn alerts_flatten_and_breakdown_agree() {
        let raw = json!({
            "pageInfo": {"totalCount": 3, "page": 0, "pageSize": 100},
            "alerts": [
                {"alertId": "a1", "alertLevel": "CRITICAL", "status": "ACTIVE",
                 "alertImpact": "HEALTH", "resourceId": "vm-1",
                 "startTimeUTC": 1700000000000i64},
                {"alertId": "a2", "alertLevel": "WARNING", "status": "ACTIVE",
                 "alertImpact": "RISK"},
                {"alertId": "a3", "alertLevel": "CRITICAL", "status": "CANCELED",
                 "alertImpact": "HEALTH"}
            ]
        });
        let report = normalize_alerts(&raw);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.summary.by_level.get("CRITICAL"), Some(&2));
        assert_eq!(report.summary.by_level.get("WARNING"), Some(&1));
        assert_eq!(report.summary.by_status.get("ACTIVE"), Some(&2));
        assert_eq!(report.summary.by_impact.get("HEALTH"), Some(&2));
        assert_eq!(report.page_info.as_ref().unwrap().total_count, 3);
        assert_eq!(report.records[0].start_time, Some(1700000000000));
        // Missing fields default rather than dropping the record
        assert_eq!(report.records[1].resource_id, None);
    }

    #[test]
    fn alerts_normalization_is_idempotent() {
        let raw = json!({"alerts": [{"alertId": "a1", "alertLevel": "WARNING"}]});
        assert_eq!(normalize_alerts(&raw), normalize_alerts(&raw));
    }

    #[test]
    fn symptoms_breakdown_counts_kpi_flags() {
        let raw = json!({
            "symptom": [
                {"id": "s1", "criticality": "critical", "kpi": true,
                 "statKeyName": "cpu|usage_average", "resourceId": "vm-1"},
                {"id": "s2", "criticality": "warning", "kpi": false,
                 "message": "High memory demand"},
                {"id": "s3", "criticality": "critical"}
            ]
        });
        let report = normalize_symptoms(&raw);
        assert_eq!(report.total_count, 3);
        assert_eq!(report.summary.by_criticality.get("critical"), Some(&2));
        assert_eq!(report.summary.kpi_count, 1);
        assert_eq!(report.summary.non_kpi_count, 2);
        assert_eq!(report.records[1].name.as_deref(), Some("High memory demand"));
    }

    #[test]
    fn symptoms_zero_shape_on_missing_array() {
        let report = normalize_symptoms(&json!({}));
        assert_eq!(report.total_count, 0);
        assert!(report.records.is_empty());
        assert_eq!(report.summary, SymptomBreakdown::default());
    }
}
