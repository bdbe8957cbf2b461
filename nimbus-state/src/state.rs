//! Deployment record structures
//!
//! Records are kept in creation order so destroy can simply walk them in
//! reverse.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The record file that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Record file format version
    pub version: u32,
    /// Monotonically increasing number for each modification
    pub serial: u64,
    /// Unique identifier for this record lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of nimbus that last modified this record
    pub nimbus_version: String,
    /// All provisioned resources, in creation order
    pub resources: Vec<ResourceRecord>,
}

impl StateFile {
    /// Current record file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty record
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            nimbus_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and stamp the current nimbus version
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.nimbus_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by type and name
    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceRecord> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or update a resource, keeping the original creation position
    pub fn upsert_resource(&mut self, resource: ResourceRecord) {
        if let Some(existing) = self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    /// Remove a resource from the record
    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceRecord> {
        self.resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)
            .map(|pos| self.resources.remove(pos))
    }

    /// Resources in reverse creation order, for destruction
    pub fn destroy_order(&self) -> Vec<ResourceRecord> {
        let mut order = self.resources.clone();
        order.reverse();
        order
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Record of a single provisioned resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource type (e.g., "vpc", "db_instance")
    pub resource_type: String,
    /// Logical resource name
    pub name: String,
    /// Binding name other resources referenced it by
    pub binding: Option<String>,
    /// AWS identifier (vpc-xxx, an ARN, ...)
    pub identifier: Option<String>,
    /// Output attributes observed at creation time
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceRecord {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            binding: None,
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_file() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn increment_serial() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn upsert_keeps_creation_position() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceRecord::new("vpc", "demo-vpc").with_identifier("vpc-1"));
        state.upsert_resource(ResourceRecord::new("subnet", "demo-public-0"));

        // Updating the VPC must not move it behind the subnet
        state.upsert_resource(ResourceRecord::new("vpc", "demo-vpc").with_identifier("vpc-2"));

        assert_eq!(state.resources.len(), 2);
        assert_eq!(state.resources[0].resource_type, "vpc");
        assert_eq!(state.resources[0].identifier.as_deref(), Some("vpc-2"));
    }

    #[test]
    fn destroy_order_is_reversed() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceRecord::new("vpc", "demo-vpc"));
        state.upsert_resource(ResourceRecord::new("subnet", "demo-public-0"));
        state.upsert_resource(ResourceRecord::new("route_table", "demo-public-rt"));

        let order = state.destroy_order();
        assert_eq!(order[0].resource_type, "route_table");
        assert_eq!(order[2].resource_type, "vpc");
    }

    #[test]
    fn remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceRecord::new("vpc", "demo-vpc"));
        assert!(state.remove_resource("vpc", "demo-vpc").is_some());
        assert!(state.remove_resource("vpc", "demo-vpc").is_none());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn serialization_round_trip() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceRecord::new("vpc", "demo-vpc")
                .with_binding("vpc")
                .with_identifier("vpc-0abc")
                .with_attribute("cidr_block", serde_json::json!("10.0.0.0/16")),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources.len(), 1);
        assert_eq!(deserialized.resources[0].binding.as_deref(), Some("vpc"));
    }
}
