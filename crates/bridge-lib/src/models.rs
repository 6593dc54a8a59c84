//! Canonical record shapes produced by the response normalizers
//!
//! Every shape here is built fresh per request/response pair, is never
//! mutated after construction, and carries defaults (`None` / empty)
//! instead of omitted fields so the presentation layer never has to
//! re-read raw monitoring JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Paging metadata echoed from the monitoring API, when present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
}

/// One time-series sample for a single stat key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Epoch milliseconds
    pub timestamp: i64,
    /// `None` when the raw slot was null or not coercible to a number
    pub value: Option<f64>,
    pub unit: String,
}

/// Roll-up of a sample sequence over its valid numeric subset
///
/// All fields are `None` when no valid sample exists; the summary never
/// carries `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub latest: Option<f64>,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    pub latest_timestamp: Option<i64>,
}

impl Summary {
    /// Compute a summary over the valid numeric subset of `samples`
    ///
    /// Samples with `None` or non-finite values contribute nothing. The
    /// latest value is the valid sample with the greatest timestamp.
    pub fn from_samples(samples: &[MetricSample]) -> Summary {
        let mut summary = Summary::default();
        let mut sum = 0.0;
        let mut count = 0u64;

        for sample in samples {
            let value = match sample.value {
                Some(v) if v.is_finite() => v,
                _ => continue,
            };
            sum += value;
            count += 1;

            if summary.min.is_none_or(|m| value < m) {
                summary.min = Some(value);
                summary.min_timestamp = Some(sample.timestamp);
            }
            if summary.max.is_none_or(|m| value > m) {
                summary.max = Some(value);
                summary.max_timestamp = Some(sample.timestamp);
            }
            if summary.latest_timestamp.is_none_or(|t| sample.timestamp >= t) {
                summary.latest = Some(value);
                summary.latest_timestamp = Some(sample.timestamp);
            }
        }

        if count > 0 {
            summary.avg = Some(sum / count as f64);
        }
        summary
    }
}

/// Flattened alert as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: Option<String>,
    pub definition_name: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub impact: Option<String>,
    pub resource_id: Option<String>,
    pub start_time: Option<i64>,
    pub update_time: Option<i64>,
}

/// Breakdown counts derived from the flattened alert records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertBreakdown {
    pub by_level: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    pub by_impact: BTreeMap<String, u64>,
}

/// Flattened symptom as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub symptom_id: Option<String>,
    pub name: Option<String>,
    pub criticality: Option<String>,
    pub kpi: bool,
    pub resource_id: Option<String>,
    pub start_time: Option<i64>,
}

/// Breakdown counts derived from the flattened symptom records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomBreakdown {
    pub by_criticality: BTreeMap<String, u64>,
    pub kpi_count: u64,
    pub non_kpi_count: u64,
}

/// One configuration property with its pipe-split category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Raw property key as returned by the monitoring API
    pub key: String,
    pub category: String,
    pub name: String,
    pub value: Option<String>,
}

/// One stat key descriptor with its pipe-split category and inferred unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatKeyDescriptor {
    pub key: String,
    pub category: String,
    pub name: String,
    pub unit: String,
}

/// Health/risk/efficiency badge attached to a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub badge_type: Option<String>,
    pub color: Option<String>,
    pub score: Option<f64>,
}

/// One entry of a resource's identifier list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Flattened resource summary row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummaryRecord {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub adapter_kind: Option<String>,
    pub resource_kind: Option<String>,
    pub health: Option<String>,
    pub badges: Vec<Badge>,
    pub identifiers: Vec<ResourceIdentifier>,
}

/// Flattened related-resource row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub adapter_kind: Option<String>,
    pub resource_kind: Option<String>,
    pub health: Option<String>,
}

/// One flat single-sample stat row (latest-stats responses)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestStatRecord {
    pub resource_id: Option<String>,
    pub stat_key: String,
    pub timestamp: Option<i64>,
    pub value: Option<f64>,
    pub unit: String,
    /// Display string produced by the shared formatting rules
    pub formatted: String,
}

/// One ranked row of a top-N response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopNEntry {
    /// 1-based position in the raw group order; callers re-sort by value
    pub rank: u64,
    pub resource_id: String,
    /// Display name resolved through the augmentation side table,
    /// falling back to the raw resource id
    pub name: String,
    pub stat_key: String,
    /// Representative value: last sample, falling back to the average
    pub value: Option<f64>,
    pub average: Option<f64>,
    pub latest: Option<f64>,
    pub unit: String,
}

/// Normalized metrics (time-series) response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub resource_id: Option<String>,
    pub stat_key: Option<String>,
    pub unit: String,
    pub samples: Vec<MetricSample>,
    pub summary: Option<Summary>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized latest-stats response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestStatsReport {
    pub records: Vec<LatestStatRecord>,
    pub summary: Option<Summary>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized top-N response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopNReport {
    pub entries: Vec<TopNEntry>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized alerts response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertsReport {
    pub records: Vec<AlertRecord>,
    pub summary: AlertBreakdown,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized symptoms response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomsReport {
    pub records: Vec<SymptomRecord>,
    pub summary: SymptomBreakdown,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized properties response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesReport {
    pub records: Vec<PropertyRecord>,
    pub by_category: BTreeMap<String, Vec<PropertyRecord>>,
    /// Sorted, distinct category names
    pub categories: Vec<String>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized stat-keys response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatKeysReport {
    pub records: Vec<StatKeyDescriptor>,
    pub by_category: BTreeMap<String, Vec<StatKeyDescriptor>>,
    pub categories: Vec<String>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized resource-list response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesReport {
    pub records: Vec<ResourceSummaryRecord>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Normalized single-resource response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDetailReport {
    pub record: Option<ResourceSummaryRecord>,
    pub total_count: u64,
}

/// Normalized relationships response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipsReport {
    pub relationship_type: Option<String>,
    pub records: Vec<RelationshipRecord>,
    pub total_count: u64,
    pub page_info: Option<PageInfo>,
}

/// Canonical normalized model, one variant per response type tag
///
/// A sum type rather than one loosely-typed record with optional fields:
/// the presentation layer matches on the variant it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum NormalizedModel {
    Metrics(MetricsReport),
    LatestStats(LatestStatsReport),
    TopN(TopNReport),
    Alerts(AlertsReport),
    Symptoms(SymptomsReport),
    Properties(PropertiesReport),
    StatKeys(StatKeysReport),
    Resources(ResourcesReport),
    ResourceDetail(ResourceDetailReport),
    Relationships(RelationshipsReport),
    /// Unclassified endpoint; the raw body is passed through untouched
    Unknown(serde_json::Value),
}

impl NormalizedModel {
    /// Number of records in the primary sequence
    pub fn total_count(&self) -> u64 {
        match self {
            NormalizedModel::Metrics(r) => r.total_count,
            NormalizedModel::LatestStats(r) => r.total_count,
            NormalizedModel::TopN(r) => r.total_count,
            NormalizedModel::Alerts(r) => r.total_count,
            NormalizedModel::Symptoms(r) => r.total_count,
            NormalizedModel::Properties(r) => r.total_count,
            NormalizedModel::StatKeys(r) => r.total_count,
            NormalizedModel::Resources(r) => r.total_count,
            NormalizedModel::ResourceDetail(r) => r.total_count,
            NormalizedModel::Relationships(r) => r.total_count,
            NormalizedModel::Unknown(_) => 0,
        }
    }
}
