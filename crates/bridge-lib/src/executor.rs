//! External request executor seam
//!
//! The monitoring API is reached through an injected capability rather
//! than a module-level client, so credential handling, transport,
//! timeouts and retries all stay with the collaborator that owns them.

use crate::request::{HttpMethod, RequestDescriptor};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Executes a synthesized request against the monitoring API
///
/// Implementations are expected to reject on transport failure; this
/// core never retries.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value>;
}

/// One row of the resource enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub identifier: String,
    pub name: Option<String>,
}

/// Endpoint used for full resource enumeration
const RESOURCE_ENUMERATION_PATH: &str = "/api/resources";

/// Fetch the full resource enumeration as `(identifier, name)` rows
///
/// Rows without an identifier are skipped; a missing `resourceList` yields
/// an empty enumeration rather than an error.
pub async fn fetch_resource_inventory(executor: &dyn RequestExecutor) -> Result<Vec<ResourceName>> {
    let request = RequestDescriptor::new(RESOURCE_ENUMERATION_PATH, HttpMethod::Get);
    let raw = executor.execute(&request).await?;

    let mut inventory = Vec::new();
    if let Some(list) = raw.get("resourceList").and_then(Value::as_array) {
        for entry in list {
            let Some(identifier) = entry.get("identifier").and_then(Value::as_str) else {
                continue;
            };
            let name = entry
                .get("resourceKey")
                .and_then(|k| k.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string);
            inventory.push(ResourceName {
                identifier: identifier.to_string(),
                name,
            });
        }
    }

    debug!(resources = inventory.len(), "Fetched resource enumeration");
    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CannedExecutor(Value);

    #[async_trait]
    impl RequestExecutor for CannedExecutor {
        async fn execute(&self, _request: &RequestDescriptor) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn inventory_skips_rows_without_identifier() {
        let executor = CannedExecutor(json!({
            "resourceList": [
                {"identifier": "r1", "resourceKey": {"name": "web-01"}},
                {"resourceKey": {"name": "orphan"}},
                {"identifier": "r2"}
            ]
        }));
        let inventory = fetch_resource_inventory(&executor).await.unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].identifier, "r1");
        assert_eq!(inventory[0].name.as_deref(), Some("web-01"));
        assert_eq!(inventory[1].name, None);
    }

    #[tokio::test]
    async fn inventory_tolerates_missing_list() {
        let executor = CannedExecutor(json!({}));
        let inventory = fetch_resource_inventory(&executor).await.unwrap();
        assert!(inventory.is_empty());
    }
}
