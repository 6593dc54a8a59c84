//! Performance aggregation into a resource profile
//!
//! Fans out two independent fetches for one resource — configuration
//! properties and a rolled-up 7-day time series — and merges them into a
//! single `ResourceProfile` for the downstream analysis call. The two
//! fetches run concurrently and fail independently: a failed half
//! degrades to its all-null default, and only both halves failing (or an
//! unresolvable identifier) propagates an error.

use crate::executor::RequestExecutor;
use crate::normalize::{coerce_number, normalize_properties};
use crate::request::{HttpMethod, QueryParams, RequestDescriptor};
use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Sentinel display name when no source supplied one
pub const UNKNOWN_RESOURCE_NAME: &str = "(unknown)";

/// Property key carrying the resource's display name
const NAME_PROPERTY_KEY: &str = "config|name";

/// Stat keys fetched for the performance half of the profile
pub const PROFILE_STAT_KEYS: &[&str] = &[
    "cpu|usage_average",
    "cpu|usagemhz_average",
    "cpu|demand_average",
    "cpu|ready_summation",
    "cpu|costop_summation",
    "mem|usage_average",
    "mem|consumed_average",
    "mem|active_average",
    "mem|granted_average",
    "mem|balloon_average",
    "mem|swapped_average",
    "diskspace|used",
    "diskspace|provisioned",
    "disk|usage_average",
    "disk|read_average",
    "disk|write_average",
    "disk|maxTotalLatency_latest",
    "virtualDisk|totalReadLatency_average",
    "virtualDisk|totalWriteLatency_average",
    "net|usage_average",
    "net|received_average",
    "net|transmitted_average",
    "net|droppedRx_summation",
    "guestfilesystem|percentage_total",
    "sys|uptime_latest",
];

/// Aggregation failures that reach the caller
///
/// Partial failures do not appear here: one half failing degrades to
/// that half's default and the call still succeeds.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("resource identifier could not be resolved: {0:?}")]
    UnresolvedResource(String),
    #[error("monitoring API unavailable (properties: {properties}; stats: {stats})")]
    Unavailable { properties: String, stats: String },
}

/// Window and rollup settings for the stats fetch
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Trailing window for the time-series fetch
    pub window: Duration,
    /// Rollup interval requested from the monitoring API, in hours
    pub rollup_interval_hours: u32,
    pub stat_keys: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(7 * 24 * 60 * 60),
            rollup_interval_hours: 1,
            stat_keys: PROFILE_STAT_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Local reduction of one stat key's rolled-up samples
///
/// `count` is the number of valid numeric samples; the remaining fields
/// are `None` when that count is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: u64,
}

impl RollupStats {
    fn from_values(values: &[f64]) -> RollupStats {
        if values.is_empty() {
            return RollupStats::default();
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in values {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        RollupStats {
            min: Some(min),
            max: Some(max),
            avg: Some(sum / values.len() as f64),
            count: values.len() as u64,
        }
    }
}

/// Epoch-millisecond bounds of the aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub begin: i64,
    pub end: i64,
}

/// Static configuration buckets, each a map of normalized keys
///
/// Every key the rule table knows is always present; unmatched or
/// unfetched keys hold JSON null rather than being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub cpu: BTreeMap<String, Value>,
    pub memory: BTreeMap<String, Value>,
    pub storage: BTreeMap<String, Value>,
    pub other: BTreeMap<String, Value>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut configuration = Self {
            cpu: BTreeMap::new(),
            memory: BTreeMap::new(),
            storage: BTreeMap::new(),
            other: BTreeMap::new(),
        };
        for rule in PROPERTY_RULES {
            configuration
                .bucket_mut(rule.bucket)
                .insert(rule.key.to_string(), Value::Null);
        }
        configuration
    }
}

impl Configuration {
    fn bucket_mut(&mut self, bucket: ConfigBucket) -> &mut BTreeMap<String, Value> {
        match bucket {
            ConfigBucket::Cpu => &mut self.cpu,
            ConfigBucket::Memory => &mut self.memory,
            ConfigBucket::Storage => &mut self.storage,
            ConfigBucket::Other => &mut self.other,
        }
    }
}

/// Merged output of the two fetches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub resource_id: String,
    pub name: String,
    pub configuration: Configuration,
    pub performance: BTreeMap<String, RollupStats>,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigBucket {
    Cpu,
    Memory,
    Storage,
    Other,
}

/// One row of the configuration-property rule table
struct PropertyRule {
    bucket: ConfigBucket,
    /// Normalized key the matched property lands under
    key: &'static str,
    /// Name patterns, matched case-insensitively against the raw key
    patterns: &'static [&'static str],
    /// When set, the raw key must also contain this substring
    context: Option<&'static str>,
}

/// Ordered rule table for property classification
///
/// Invariant: evaluation is strictly top to bottom and the first match
/// wins, so more specific names must stay above the generic ones
/// (`corespersocket` before the bare `socket` rule). This is a literal
/// list, not a map, on purpose.
static PROPERTY_RULES: &[PropertyRule] = &[
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "cores_per_socket",
        patterns: &["corespersocket"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "num_sockets",
        patterns: &["socket"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "num_cpus",
        patterns: &["numcpu", "cpucount", "corecount"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "cpu_speed_mhz",
        patterns: &["speed", "mhz", "hz"],
        context: Some("cpu"),
    },
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "cpu_model",
        patterns: &["cpumodel", "processor"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Cpu,
        key: "cpu_reservation",
        patterns: &["reservation"],
        context: Some("cpu"),
    },
    PropertyRule {
        bucket: ConfigBucket::Memory,
        key: "memory_kb",
        patterns: &["memorykb", "memkb"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Memory,
        key: "memory_reservation",
        patterns: &["reservation"],
        context: Some("mem"),
    },
    PropertyRule {
        bucket: ConfigBucket::Memory,
        key: "memory_limit",
        patterns: &["limit"],
        context: Some("mem"),
    },
    PropertyRule {
        bucket: ConfigBucket::Memory,
        key: "memory_kb",
        patterns: &["size", "kb"],
        context: Some("mem"),
    },
    PropertyRule {
        bucket: ConfigBucket::Storage,
        key: "disk_used_gb",
        patterns: &["diskspace.*used", "useddiskspace"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Storage,
        key: "disk_provisioned_gb",
        patterns: &["diskspace.*(provisioned|capacity)", "provisioneddiskspace"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Storage,
        key: "disk_count",
        patterns: &["numvirtualdisk", "diskcount"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Storage,
        key: "datastore",
        patterns: &["datastore"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "guest_os",
        patterns: &["guestfullname", "guest.*os", "osname"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "power_state",
        patterns: &["powerstate"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "host_name",
        patterns: &["hostname", "parenthost"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "ip_address",
        patterns: &["ipaddress"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "hardware_version",
        patterns: &["hardwareversion", "vmversion"],
        context: None,
    },
    PropertyRule {
        bucket: ConfigBucket::Other,
        key: "uptime",
        patterns: &["uptime"],
        context: None,
    },
];

struct CompiledRule {
    rule: &'static PropertyRule,
    regexes: Vec<Regex>,
}

fn compiled_rules() -> &'static [CompiledRule] {
    static COMPILED: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PROPERTY_RULES
            .iter()
            .map(|rule| CompiledRule {
                rule,
                regexes: rule
                    .patterns
                    .iter()
                    .map(|pattern| Regex::new(pattern).expect("invalid property rule pattern"))
                    .collect(),
            })
            .collect()
    })
}

/// First rule matching a raw property key, in table order
fn classify_property(raw_key: &str) -> Option<&'static PropertyRule> {
    let lowered = raw_key.to_ascii_lowercase();
    for compiled in compiled_rules() {
        if let Some(context) = compiled.rule.context {
            if !lowered.contains(context) {
                continue;
            }
        }
        if compiled.regexes.iter().any(|regex| regex.is_match(&lowered)) {
            return Some(compiled.rule);
        }
    }
    None
}

/// Property values prefer their numeric form when they parse as one
fn scalar_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

/// Collects and merges the two halves of a resource profile
pub struct ProfileCollector {
    executor: Arc<dyn RequestExecutor>,
    config: CollectorConfig,
}

impl ProfileCollector {
    pub fn new(executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            executor,
            config: CollectorConfig::default(),
        }
    }

    pub fn with_config(executor: Arc<dyn RequestExecutor>, config: CollectorConfig) -> Self {
        Self { executor, config }
    }

    /// Aggregate configuration and performance for one resource
    ///
    /// `display_name` wins over any fetched name; a blank resource id is
    /// the one unrecoverable input.
    pub async fn aggregate(
        &self,
        resource_id: &str,
        display_name: Option<&str>,
    ) -> Result<ResourceProfile, ProfileError> {
        let resource_id = resource_id.trim();
        if resource_id.is_empty() {
            return Err(ProfileError::UnresolvedResource(resource_id.to_string()));
        }

        let end = Utc::now().timestamp_millis();
        let begin = end - self.config.window.as_millis() as i64;

        let (configuration_result, performance_result) = tokio::join!(
            self.fetch_configuration(resource_id),
            self.fetch_performance(resource_id, begin, end)
        );

        if let (Err(properties), Err(stats)) = (&configuration_result, &performance_result) {
            return Err(ProfileError::Unavailable {
                properties: properties.to_string(),
                stats: stats.to_string(),
            });
        }

        let (configuration, fetched_name) = configuration_result.unwrap_or_else(|error| {
            warn!(resource_id, %error, "Property fetch failed; configuration degrades to defaults");
            (Configuration::default(), None)
        });
        let performance = performance_result.unwrap_or_else(|error| {
            warn!(resource_id, %error, "Stats fetch failed; performance degrades to defaults");
            self.empty_performance()
        });

        let name = display_name
            .map(str::to_string)
            .or(fetched_name)
            .unwrap_or_else(|| UNKNOWN_RESOURCE_NAME.to_string());

        Ok(ResourceProfile {
            resource_id: resource_id.to_string(),
            name,
            configuration,
            performance,
            time_range: TimeRange { begin, end },
        })
    }

    /// Every configured stat key mapped to the zero rollup
    fn empty_performance(&self) -> BTreeMap<String, RollupStats> {
        self.config
            .stat_keys
            .iter()
            .map(|key| (key.clone(), RollupStats::default()))
            .collect()
    }

    async fn fetch_configuration(
        &self,
        resource_id: &str,
    ) -> Result<(Configuration, Option<String>)> {
        let request = RequestDescriptor::new(
            format!("/api/resources/{}/properties", resource_id),
            HttpMethod::Get,
        );
        let raw = self
            .executor
            .execute(&request)
            .await
            .context("property fetch")?;

        let report = normalize_properties(&raw);
        let mut configuration = Configuration::default();
        let mut fetched_name = None;

        for record in &report.records {
            if record.key == NAME_PROPERTY_KEY {
                fetched_name = record.value.clone();
            }
            let Some(rule) = classify_property(&record.key) else {
                continue;
            };
            let Some(value) = &record.value else {
                continue;
            };
            let slot = configuration
                .bucket_mut(rule.bucket)
                .entry(rule.key.to_string())
                .or_insert(Value::Null);
            // First property to match a key wins; later matches for the
            // same normalized key never overwrite
            if slot.is_null() {
                *slot = scalar_value(value);
            }
        }

        debug!(
            resource_id,
            properties = report.total_count,
            "Classified configuration properties"
        );
        Ok((configuration, fetched_name))
    }

    async fn fetch_performance(
        &self,
        resource_id: &str,
        begin: i64,
        end: i64,
    ) -> Result<BTreeMap<String, RollupStats>> {
        let mut query = QueryParams::new();
        for key in &self.config.stat_keys {
            query.push("statKey", key.clone());
        }
        query.push("begin", begin.to_string());
        query.push("end", end.to_string());
        query.push("rollUpType", "AVG");
        query.push("intervalType", "HOURS");
        query.push(
            "intervalQuantifier",
            self.config.rollup_interval_hours.to_string(),
        );

        let request =
            RequestDescriptor::new(format!("/api/resources/{}/stats", resource_id), HttpMethod::Get)
                .with_query(query);
        let raw = self
            .executor
            .execute(&request)
            .await
            .context("stats fetch")?;

        let mut performance = self.empty_performance();
        let resources = raw
            .get("values")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for resource in resources {
            let stats = resource
                .get("stat-list")
                .and_then(|list| list.get("stat"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for stat in stats {
                let Some(key) = stat
                    .get("statKey")
                    .and_then(|k| k.get("key"))
                    .and_then(Value::as_str)
                else {
                    continue;
                };
                let values: Vec<f64> = stat
                    .get("data")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(coerce_number)
                    .collect();
                performance.insert(key.to_string(), RollupStats::from_values(&values));
            }
        }

        Ok(performance)
    }
}
