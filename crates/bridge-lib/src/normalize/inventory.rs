//! Resource inventory normalizers
//!
//! Projects the monitoring API's nested `resourceKey`, `badges` and
//! `resourceIdentifiers` substructures into flat records. Every optional
//! field defaults to `None` or an empty list; no key is ever omitted.

use super::{page_info, str_field};
use crate::models::{
    Badge, RelationshipRecord, RelationshipsReport, ResourceDetailReport, ResourceIdentifier,
    ResourceSummaryRecord, ResourcesReport,
};
use serde_json::Value;

fn resource_key_field(resource: &Value, key: &str) -> Option<String> {
    resource.get("resourceKey").and_then(|k| str_field(k, key))
}

fn badges(resource: &Value) -> Vec<Badge> {
    resource
        .get("badges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|badge| Badge {
            badge_type: str_field(badge, "type"),
            color: str_field(badge, "color"),
            score: badge.get("score").and_then(Value::as_f64),
        })
        .collect()
}

fn identifiers(resource: &Value) -> Vec<ResourceIdentifier> {
    resource
        .get("resourceKey")
        .and_then(|k| k.get("resourceIdentifiers"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|entry| ResourceIdentifier {
            name: entry
                .get("identifierType")
                .and_then(|t| str_field(t, "name")),
            value: str_field(entry, "value"),
        })
        .collect()
}

fn flatten_resource(resource: &Value) -> ResourceSummaryRecord {
    ResourceSummaryRecord {
        identifier: str_field(resource, "identifier"),
        name: resource_key_field(resource, "name"),
        adapter_kind: resource_key_field(resource, "adapterKindKey"),
        resource_kind: resource_key_field(resource, "resourceKindKey"),
        health: str_field(resource, "resourceHealth"),
        badges: badges(resource),
        identifiers: identifiers(resource),
    }
}

/// Normalize a resource-list response
pub fn normalize_resources(raw: &Value) -> ResourcesReport {
    let entries = raw
        .get("resourceList")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<ResourceSummaryRecord> = entries.iter().map(flatten_resource).collect();

    ResourcesReport {
        total_count: records.len() as u64,
        records,
        page_info: page_info(raw),
    }
}

/// Normalize a single-resource response
///
/// The raw body is the resource object itself; a body carrying neither
/// an identifier nor a resource key degrades to the zero shape.
pub fn normalize_resource_detail(raw: &Value) -> ResourceDetailReport {
    if raw.get("identifier").is_none() && raw.get("resourceKey").is_none() {
        return ResourceDetailReport::default();
    }
    ResourceDetailReport {
        record: Some(flatten_resource(raw)),
        total_count: 1,
    }
}

/// Normalize a relationships response
pub fn normalize_relationships(raw: &Value) -> RelationshipsReport {
    let entries = raw
        .get("resourceList")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let records: Vec<RelationshipRecord> = entries
        .iter()
        .map(|resource| RelationshipRecord {
            identifier: str_field(resource, "identifier"),
            name: resource_key_field(resource, "name"),
            adapter_kind: resource_key_field(resource, "adapterKindKey"),
            resource_kind: resource_key_field(resource, "resourceKindKey"),
            health: str_field(resource, "resourceHealth"),
        })
        .collect();

    RelationshipsReport {
        relationship_type: str_field(raw, "relationshipType"),
        total_count: records.len() as u64,
        records,
        page_info: page_info(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(identifier: &str, name: &str) -> Value {
        json!({
            "identifier": identifier,
            "resourceKey": {
                "name": name,
                "adapterKindKey": "VMWARE",
                "resourceKindKey": "VirtualMachine",
                "resourceIdentifiers": [
                    {"identifierType": {"name": "VMEntityInstanceUUID"}, "value": "502a"}
                ]
            },
            "resourceHealth": "GREEN",
            "badges": [{"type": "HEALTH", "color": "GREEN", "score": 100.0}]
        })
    }

    #[test]
    fn resources_flatten_nested_substructures() {
        let raw = json!({
            "pageInfo": {"totalCount": 2, "page": 0, "pageSize": 1000},
            "resourceList": [resource("r1", "web-01"), {"identifier": "r2"}]
        });
        let report = normalize_resources(&raw);
        assert_eq!(report.total_count, 2);
        let first = &report.records[0];
        assert_eq!(first.name.as_deref(), Some("web-01"));
        assert_eq!(first.resource_kind.as_deref(), Some("VirtualMachine"));
        assert_eq!(first.badges[0].score, Some(100.0));
        assert_eq!(
            first.identifiers[0].name.as_deref(),
            Some("VMEntityInstanceUUID")
        );
        // Sparse rows still produce full records with defaults
        let second = &report.records[1];
        assert_eq!(second.name, None);
        assert!(second.badges.is_empty());
        assert!(second.identifiers.is_empty());
    }

    #[test]
    fn resources_zero_shape_on_missing_list() {
        let report = normalize_resources(&json!({}));
        assert_eq!(report.total_count, 0);
        assert!(report.records.is_empty());
    }

    #[test]
    fn resource_detail_wraps_single_object() {
        let report = normalize_resource_detail(&resource("r1", "web-01"));
        assert_eq!(report.total_count, 1);
        assert_eq!(report.record.unwrap().identifier.as_deref(), Some("r1"));
    }

    #[test]
    fn resource_detail_zero_shape_on_unrecognized_body() {
        let report = normalize_resource_detail(&json!({"error": "not found"}));
        assert_eq!(report.total_count, 0);
        assert_eq!(report.record, None);
    }

    #[test]
    fn relationships_flatten_related_resources() {
        let raw = json!({
            "relationshipType": "CHILD",
            "resourceList": [resource("r2", "datastore-7")]
        });
        let report = normalize_relationships(&raw);
        assert_eq!(report.total_count, 1);
        assert_eq!(report.relationship_type.as_deref(), Some("CHILD"));
        assert_eq!(report.records[0].name.as_deref(), Some("datastore-7"));
    }

    #[test]
    fn relationships_zero_shape_on_missing_list() {
        let report = normalize_relationships(&json!({}));
        assert_eq!(report.total_count, 0);
        assert!(report.records.is_empty());
        assert_eq!(report.relationship_type, None);
    }
}
