//! Response type classification from endpoint paths
//!
//! An explicitly ordered rule table evaluated top to bottom; the first
//! matching predicate wins. Ordering is load-bearing: `/stats/latest`
//! and `/stats/topn` must be tested before the generic `/stats` rule,
//! and every stat/property suffix before the bare `/resources` rules.

use serde::{Deserialize, Serialize};

/// Closed set of response families the normalizers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseTypeTag {
    Alerts,
    Metrics,
    LatestStats,
    StatKeys,
    Symptoms,
    Properties,
    Resources,
    ResourceDetail,
    Relationships,
    TopN,
    Unknown,
}

type Predicate = fn(&str) -> bool;

/// Ordered dispatch table; first match wins
static RULES: &[(Predicate, ResponseTypeTag)] = &[
    (|path| path.contains("/alerts"), ResponseTypeTag::Alerts),
    (
        |path| path.contains("/stats/latest"),
        ResponseTypeTag::LatestStats,
    ),
    (|path| path.contains("/stats/topn"), ResponseTypeTag::TopN),
    (
        |path| path.contains("/stats") || path.contains("/metrics"),
        ResponseTypeTag::Metrics,
    ),
    (
        |path| path.contains("/properties"),
        ResponseTypeTag::Properties,
    ),
    (|path| path.contains("/statkeys"), ResponseTypeTag::StatKeys),
    (|path| path.contains("/symptoms"), ResponseTypeTag::Symptoms),
    (
        |path| path.contains("/relationships"),
        ResponseTypeTag::Relationships,
    ),
    (is_resource_detail, ResponseTypeTag::ResourceDetail),
    (
        |path| path.contains("/resources"),
        ResponseTypeTag::Resources,
    ),
];

/// Classify an endpoint path into its response family
pub fn classify(endpoint_path: &str) -> ResponseTypeTag {
    for (predicate, tag) in RULES {
        if predicate(endpoint_path) {
            return *tag;
        }
    }
    ResponseTypeTag::Unknown
}

/// A bare `/resources/{36-char-id}` with no further path suffix
fn is_resource_detail(path: &str) -> bool {
    let Some(index) = path.find("/resources/") else {
        return false;
    };
    let rest = &path[index + "/resources/".len()..];
    rest.len() == 36 && !rest.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "11111111-2222-3333-4444-555555555555";

    #[test]
    fn stat_suffixes_win_over_resource_rules() {
        let path = format!("/api/resources/{}/stats/latest", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::LatestStats);

        let path = format!("/api/resources/{}/stats", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::Metrics);

        let path = format!("/api/resources/{}/statkeys", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::StatKeys);
    }

    #[test]
    fn topn_wins_over_generic_stats() {
        assert_eq!(
            classify("/api/resources/stats/topn"),
            ResponseTypeTag::TopN
        );
    }

    #[test]
    fn bare_uuid_is_resource_detail() {
        let path = format!("/api/resources/{}", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::ResourceDetail);
    }

    #[test]
    fn short_id_is_plain_resources() {
        assert_eq!(classify("/api/resources/33"), ResponseTypeTag::Resources);
        assert_eq!(classify("/api/resources"), ResponseTypeTag::Resources);
    }

    #[test]
    fn suffixed_uuid_is_not_resource_detail() {
        let path = format!("/api/resources/{}/relationships", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::Relationships);

        let path = format!("/api/resources/{}/properties", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::Properties);

        let path = format!("/api/resources/{}/symptoms", UUID);
        assert_eq!(classify(&path), ResponseTypeTag::Symptoms);
    }

    #[test]
    fn alerts_and_metrics_paths() {
        assert_eq!(classify("/api/alerts"), ResponseTypeTag::Alerts);
        assert_eq!(classify("/api/metrics"), ResponseTypeTag::Metrics);
    }

    #[test]
    fn unmatched_paths_are_unknown() {
        assert_eq!(classify("/api/auth/token"), ResponseTypeTag::Unknown);
        assert_eq!(classify("/"), ResponseTypeTag::Unknown);
    }
}
