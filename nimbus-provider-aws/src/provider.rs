//! AWS Cloud Control Provider implementation
//!
//! Talks to the AWS Cloud Control API to manage resources: desired state is
//! rendered to the CloudFormation property shape, submitted, and the async
//! operation is polled to completion. Route53 record sets are the one
//! resource Cloud Control cannot manage; they are delegated to the Route53
//! API in `dns`.

use std::collections::HashMap;
use std::time::Duration;

use aws_config::Region;
use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::types::OperationStatus;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use nimbus_core::provider::{ProviderError, ProviderResult};
use nimbus_core::resource::{Resource, ResourceId, State, Value};
use serde_json::json;

use crate::dns::RecordSets;
use crate::resources::{ResourceConfig, get_resource_config};
use crate::utils::{to_pascal_case, to_snake_case};

/// Resource types that support in-place updates; everything else must be
/// replaced
const UPDATABLE_TYPES: &[&str] = &["vpc", "autoscaling_group"];

/// AWS Cloud Control Provider
pub struct AwsProvider {
    cloudcontrol_client: CloudControlClient,
    records: RecordSets,
}

impl AwsProvider {
    /// Create a new AwsProvider for the specified region
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            cloudcontrol_client: CloudControlClient::new(&config),
            records: RecordSets::new(&config),
        }
    }

    // =========================================================================
    // Cloud Control API Methods
    // =========================================================================

    /// Get a resource by identifier using Cloud Control API
    pub async fn cc_get_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<Option<serde_json::Value>> {
        let result = self
            .cloudcontrol_client
            .get_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await;

        match result {
            Ok(response) => {
                if let Some(desc) = response.resource_description()
                    && let Some(props_str) = desc.properties()
                {
                    let props: serde_json::Value =
                        serde_json::from_str(props_str).unwrap_or_default();
                    Ok(Some(props))
                } else {
                    Ok(None)
                }
            }
            Err(e) => {
                let err_str = format!("{:?}", e);
                if err_str.contains("ResourceNotFound") || err_str.contains("NotFound") {
                    Ok(None)
                } else {
                    Err(ProviderError::new(format!("Failed to get resource: {:?}", e)))
                }
            }
        }
    }

    /// Create a resource using Cloud Control API
    pub async fn cc_create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> ProviderResult<String> {
        let result = self
            .cloudcontrol_client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to create resource: {:?}", e)))?;

        let request_token = result
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or_else(|| ProviderError::new("No request token returned"))?;

        self.wait_for_operation(request_token).await
    }

    /// Update a resource using Cloud Control API
    pub async fn cc_update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> ProviderResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let patch_document = serde_json::to_string(&patch_ops)
            .map_err(|e| ProviderError::new(format!("Failed to build patch: {}", e)))?;

        let result = self
            .cloudcontrol_client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(patch_document)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to update resource: {:?}", e)))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }

    /// Delete a resource using Cloud Control API
    pub async fn cc_delete_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> ProviderResult<()> {
        let result = self
            .cloudcontrol_client
            .delete_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to delete resource: {:?}", e)))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            self.wait_for_operation(request_token).await?;
        }

        Ok(())
    }

    /// Wait for a Cloud Control operation to complete
    async fn wait_for_operation(&self, request_token: &str) -> ProviderResult<String> {
        let max_attempts = 120;
        let delay = Duration::from_secs(5);

        for _ in 0..max_attempts {
            let status = self
                .cloudcontrol_client
                .get_resource_request_status()
                .request_token(request_token)
                .send()
                .await
                .map_err(|e| {
                    ProviderError::new(format!("Failed to get operation status: {:?}", e))
                })?;

            if let Some(progress) = status.progress_event() {
                match progress.operation_status() {
                    Some(OperationStatus::Success) => {
                        return Ok(progress.identifier().unwrap_or("").to_string());
                    }
                    Some(OperationStatus::Failed) => {
                        let msg = progress.status_message().unwrap_or("Unknown error");
                        return Err(ProviderError::new(format!("Operation failed: {}", msg)));
                    }
                    Some(OperationStatus::CancelComplete) => {
                        return Err(ProviderError::new("Operation was cancelled"));
                    }
                    _ => {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ProviderError::new("Operation timed out"))
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by identifier
    pub async fn read_resource(
        &self,
        resource_type: &str,
        name: &str,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let id = ResourceId::new(resource_type, name);

        let identifier = match identifier {
            Some(id) => id,
            None => return Ok(State::not_found(id)),
        };

        if resource_type == "dns_record" {
            return self.records.read(&id, identifier).await;
        }

        let config = config_for(&id)?;
        let props = match self.cc_get_resource(config.aws_type_name, identifier).await? {
            Some(props) => props,
            None => return Ok(State::not_found(id)),
        };

        let mut attributes = HashMap::new();

        for (nimbus_name, aws_name) in config.attributes {
            if let Some(value) = props.get(aws_name)
                && let Some(v) = json_to_attr(value)
            {
                attributes.insert(nimbus_name.to_string(), v);
            }
        }

        if config.has_tags
            && let Some(tags_array) = props.get("Tags").and_then(|v| v.as_array())
        {
            let tags_map = parse_tags(tags_array);
            if !tags_map.is_empty() {
                attributes.insert("tags".to_string(), Value::Map(tags_map));
            }
        }

        read_special_attributes(resource_type, &props, &mut attributes);

        Ok(State::existing(id, attributes).with_identifier(identifier))
    }

    /// Create a resource
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        if resource.id.resource_type == "dns_record" {
            return self.records.upsert(&resource).await;
        }

        let config = config_for(&resource.id)?;
        let desired_state = render_desired_state(&resource, config)
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        let identifier = self
            .cc_create_resource(config.aws_type_name, serde_json::Value::Object(desired_state))
            .await
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        self.read_resource(&resource.id.resource_type, &resource.id.name, Some(&identifier))
            .await
    }

    /// Update a resource in place
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        if id.resource_type == "dns_record" {
            return self.records.upsert(&to).await;
        }

        let config = config_for(&id)?;

        if !UPDATABLE_TYPES.contains(&id.resource_type.as_str()) {
            return Err(ProviderError::new(format!(
                "Update not supported for {}, delete and recreate",
                id.resource_type
            ))
            .for_resource(id));
        }

        let desired_state =
            render_desired_state(&to, config).map_err(|e| e.for_resource(id.clone()))?;

        let patch_ops: Vec<serde_json::Value> = desired_state
            .into_iter()
            .map(|(path, value)| {
                json!({
                    "op": "replace",
                    "path": format!("/{}", path),
                    "value": value
                })
            })
            .collect();

        self.cc_update_resource(config.aws_type_name, identifier, patch_ops)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        self.read_resource(&id.resource_type, &id.name, Some(identifier))
            .await
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        if id.resource_type == "dns_record" {
            return self.records.delete(id, identifier).await;
        }

        let config = config_for(id)?;

        self.pre_delete_operations(id, config, identifier).await?;

        self.cc_delete_resource(config.aws_type_name, identifier)
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Handle pre-delete operations (e.g., detach IGW from VPC)
    async fn pre_delete_operations(
        &self,
        id: &ResourceId,
        config: &ResourceConfig,
        identifier: &str,
    ) -> ProviderResult<()> {
        if id.resource_type == "internet_gateway" {
            // Detach from VPC first
            if let Some(props) = self.cc_get_resource(config.aws_type_name, identifier).await?
                && let Some(attachments) = props.get("Attachments").and_then(|v| v.as_array())
                && !attachments.is_empty()
            {
                let patch_ops = vec![json!({"op": "remove", "path": "/Attachments"})];
                let _ = self
                    .cc_update_resource(config.aws_type_name, identifier, patch_ops)
                    .await;
            }
        }
        Ok(())
    }
}

fn config_for(id: &ResourceId) -> ProviderResult<&'static ResourceConfig> {
    get_resource_config(&id.resource_type).ok_or_else(|| {
        ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
            .for_resource(id.clone())
    })
}

// =============================================================================
// Desired State Rendering
// =============================================================================

/// Render a resource's attributes to the CloudFormation property shape
fn render_desired_state(
    resource: &Resource,
    config: &ResourceConfig,
) -> ProviderResult<serde_json::Map<String, serde_json::Value>> {
    let mut desired_state = serde_json::Map::new();

    for (nimbus_name, aws_name) in config.attributes {
        // Tags go through the shared Key/Value rendering below
        if *nimbus_name == "tags" && config.has_tags {
            continue;
        }
        if let Some(value) = resource.attributes.get(*nimbus_name) {
            if let Some(v) = attr_to_json(value) {
                desired_state.insert(aws_name.to_string(), v);
            } else {
                return Err(ProviderError::new(format!(
                    "Attribute '{}' still contains an unresolved reference",
                    nimbus_name
                )));
            }
        }
    }

    create_special_attributes(&resource.id.resource_type, &mut desired_state);

    if config.has_tags {
        let tags = build_tags(resource.attributes.get("tags"));
        if !tags.is_empty() {
            desired_state.insert("Tags".to_string(), json!(tags));
        }
    }

    Ok(desired_state)
}

/// Attributes that need more than the standard mapping
fn create_special_attributes(
    resource_type: &str,
    desired_state: &mut serde_json::Map<String, serde_json::Value>,
) {
    if resource_type == "launch_template"
        && let Some(data) = desired_state.get_mut("LaunchTemplateData")
        && let Some(user_data) = data.get("UserData").and_then(|v| v.as_str())
    {
        // Launch templates carry user data base64-encoded on the wire
        let encoded = BASE64.encode(user_data.as_bytes());
        data["UserData"] = json!(encoded);
    }
}

/// Inverse special cases applied when reading state back
fn read_special_attributes(
    resource_type: &str,
    props: &serde_json::Value,
    attributes: &mut HashMap<String, Value>,
) {
    match resource_type {
        "internet_gateway" => {
            if let Some(attachments) = props.get("Attachments").and_then(|v| v.as_array())
                && let Some(first) = attachments.first()
                && let Some(vpc_id) = first.get("VpcId").and_then(|v| v.as_str())
            {
                attributes.insert("vpc_id".to_string(), Value::string(vpc_id));
            }
        }
        "db_instance" => {
            // Surface the nested endpoint so user-data templates can reach it
            if let Some(endpoint) = props.get("Endpoint") {
                if let Some(address) = endpoint.get("Address").and_then(|v| v.as_str()) {
                    attributes.insert("endpoint_address".to_string(), Value::string(address));
                }
                if let Some(port) = endpoint.get("Port").and_then(json_to_attr) {
                    attributes.insert("endpoint_port".to_string(), port);
                }
            }
        }
        "launch_template" => {
            // Decode user data back to the declared plaintext so diffs compare
            // like with like
            if let Some(Value::Map(data)) = attributes.get_mut("launch_template_data")
                && let Some(Value::String(user_data)) = data.get("user_data")
                && let Ok(decoded) = BASE64.decode(user_data.as_bytes())
                && let Ok(text) = String::from_utf8(decoded)
            {
                data.insert("user_data".to_string(), Value::String(text));
            }
        }
        _ => {}
    }
}

// =============================================================================
// Value Conversion
// =============================================================================

/// Convert an attribute value to CloudFormation JSON, converting nested map
/// keys to PascalCase. References must be resolved first; they yield `None`.
fn attr_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::String(s) => Some(json!(s)),
        Value::Int(i) => Some(json!(i)),
        Value::Float(f) => Some(json!(f)),
        Value::Bool(b) => Some(json!(b)),
        Value::List(items) => {
            let arr: Vec<serde_json::Value> = items.iter().map(attr_to_json).collect::<Option<_>>()?;
            Some(serde_json::Value::Array(arr))
        }
        Value::Map(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                obj.insert(to_pascal_case(k), attr_to_json(v)?);
            }
            Some(serde_json::Value::Object(obj))
        }
        Value::Ref(_, _) | Value::Template(_) => None,
    }
}

/// Convert CloudFormation JSON to an attribute value, converting nested map
/// keys back to snake_case
fn json_to_attr(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Int(i))
            } else {
                n.as_f64().map(Value::Float)
            }
        }
        serde_json::Value::Array(arr) => {
            Some(Value::List(arr.iter().filter_map(json_to_attr).collect()))
        }
        serde_json::Value::Object(obj) => {
            let mut map = HashMap::new();
            for (k, v) in obj {
                if let Some(value) = json_to_attr(v) {
                    map.insert(to_snake_case(k), value);
                }
            }
            Some(Value::Map(map))
        }
        serde_json::Value::Null => None,
    }
}

// =============================================================================
// Tag Helpers
// =============================================================================

/// Build tags array in the CloudFormation [{Key, Value}] shape
fn build_tags(user_tags: Option<&Value>) -> Vec<serde_json::Value> {
    let mut tags = Vec::new();
    if let Some(Value::Map(user_tags)) = user_tags {
        let mut keys: Vec<_> = user_tags.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(Value::String(v)) = user_tags.get(key) {
                tags.push(json!({"Key": key, "Value": v}));
            }
        }
    }
    tags
}

/// Parse tags from the CloudFormation shape back into a map
fn parse_tags(tags_array: &[serde_json::Value]) -> HashMap<String, Value> {
    let mut tags_map = HashMap::new();
    for tag in tags_array {
        if let (Some(key), Some(value)) = (
            tag.get("Key").and_then(|v| v.as_str()),
            tag.get("Value").and_then(|v| v.as_str()),
        ) {
            tags_map.insert(key.to_string(), Value::string(value));
        }
    }
    tags_map
}
