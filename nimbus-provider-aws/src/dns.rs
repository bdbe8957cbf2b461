//! Route53 record set management
//!
//! Record sets are not Cloud Control resource types, so they go through the
//! Route53 API directly: creates and updates are a single UPSERT change
//! batch, deletes a DELETE batch. The identifier is `zone:name:type`.

use std::collections::HashMap;

use aws_sdk_route53::Client as Route53Client;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecordSet, RrType,
};
use nimbus_core::provider::{ProviderError, ProviderResult};
use nimbus_core::resource::{Resource, ResourceId, State, Value};

pub struct RecordSets {
    client: Route53Client,
}

impl RecordSets {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Route53Client::new(config),
        }
    }

    /// Create or update an alias record
    pub async fn upsert(&self, resource: &Resource) -> ProviderResult<State> {
        let spec = RecordSpec::from_resource(resource)?;

        let record_set = spec
            .to_record_set()
            .map_err(|e| e.for_resource(resource.id.clone()))?;

        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build change: {}", e)))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build change batch: {}", e)))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&spec.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to upsert record set: {:?}", e))
                    .for_resource(resource.id.clone())
            })?;

        let identifier = spec.identifier();
        let mut attributes = resource.attributes.clone();
        attributes.insert("fqdn".to_string(), Value::string(&spec.name));

        Ok(State::existing(resource.id.clone(), attributes).with_identifier(identifier))
    }

    /// Read a record set back by its `zone:name:type` identifier
    pub async fn read(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let (zone, name, record_type) = split_identifier(identifier)
            .ok_or_else(|| ProviderError::new(format!("Invalid record identifier: {}", identifier)))?;

        let response = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone)
            .start_record_name(name)
            .start_record_type(RrType::from(record_type))
            .max_items(1)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to list record sets: {:?}", e)))?;

        let Some(record) = response
            .resource_record_sets()
            .iter()
            .find(|r| normalize_name(r.name()) == normalize_name(name))
        else {
            return Ok(State::not_found(id.clone()));
        };

        let mut attributes = HashMap::new();
        attributes.insert("hosted_zone_id".to_string(), Value::string(zone));
        attributes.insert("name".to_string(), Value::string(normalize_name(record.name())));
        attributes.insert(
            "record_type".to_string(),
            Value::string(record.r#type().as_str()),
        );
        if let Some(alias) = record.alias_target() {
            let mut target = HashMap::new();
            target.insert("dns_name".to_string(), Value::string(normalize_name(alias.dns_name())));
            target.insert(
                "hosted_zone_id".to_string(),
                Value::string(alias.hosted_zone_id()),
            );
            target.insert(
                "evaluate_target_health".to_string(),
                Value::Bool(alias.evaluate_target_health()),
            );
            attributes.insert("alias_target".to_string(), Value::Map(target));
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    /// Delete a record set; the alias target is re-read so the DELETE batch
    /// matches the live record exactly
    pub async fn delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let state = self.read(id, identifier).await?;
        if !state.exists {
            return Ok(());
        }

        let resource = Resource {
            id: id.clone(),
            attributes: state.attributes,
        };
        let spec = RecordSpec::from_resource(&resource)?;

        let record_set = spec.to_record_set().map_err(|e| e.for_resource(id.clone()))?;

        let change = Change::builder()
            .action(ChangeAction::Delete)
            .resource_record_set(record_set)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build change: {}", e)))?;

        let batch = ChangeBatch::builder()
            .changes(change)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build change batch: {}", e)))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&spec.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(format!("Failed to delete record set: {:?}", e))
                    .for_resource(id.clone())
            })?;

        Ok(())
    }
}

/// The attribute shape of a dns_record resource, extracted and checked
#[derive(Debug)]
struct RecordSpec {
    hosted_zone_id: String,
    name: String,
    record_type: String,
    alias_dns_name: String,
    alias_hosted_zone_id: String,
    evaluate_target_health: bool,
}

impl RecordSpec {
    fn from_resource(resource: &Resource) -> ProviderResult<Self> {
        let get_string = |key: &str| -> ProviderResult<String> {
            resource
                .attributes
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::new(format!("Missing record attribute '{}'", key))
                        .for_resource(resource.id.clone())
                })
        };

        let Some(Value::Map(alias)) = resource.attributes.get("alias_target") else {
            return Err(ProviderError::new("Missing record attribute 'alias_target'")
                .for_resource(resource.id.clone()));
        };
        let alias_string = |key: &str| -> ProviderResult<String> {
            alias.get(key).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
                ProviderError::new(format!("Missing alias_target attribute '{}'", key))
                    .for_resource(resource.id.clone())
            })
        };

        Ok(Self {
            hosted_zone_id: get_string("hosted_zone_id")?,
            name: get_string("name")?,
            record_type: get_string("record_type")?,
            alias_dns_name: alias_string("dns_name")?,
            alias_hosted_zone_id: alias_string("hosted_zone_id")?,
            evaluate_target_health: matches!(
                alias.get("evaluate_target_health"),
                Some(Value::Bool(true))
            ),
        })
    }

    fn identifier(&self) -> String {
        format!("{}:{}:{}", self.hosted_zone_id, self.name, self.record_type)
    }

    fn to_record_set(&self) -> ProviderResult<ResourceRecordSet> {
        let alias = AliasTarget::builder()
            .hosted_zone_id(&self.alias_hosted_zone_id)
            .dns_name(&self.alias_dns_name)
            .evaluate_target_health(self.evaluate_target_health)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build alias target: {}", e)))?;

        ResourceRecordSet::builder()
            .name(&self.name)
            .r#type(RrType::from(self.record_type.as_str()))
            .alias_target(alias)
            .build()
            .map_err(|e| ProviderError::new(format!("Failed to build record set: {}", e)))
    }
}

/// Split a `zone:name:type` identifier
fn split_identifier(identifier: &str) -> Option<(&str, &str, &str)> {
    let mut parts = identifier.splitn(3, ':');
    Some((parts.next()?, parts.next()?, parts.next()?))
}

/// Route53 returns names with a trailing dot
fn normalize_name(name: &str) -> &str {
    name.trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Resource {
        let mut alias = HashMap::new();
        alias.insert("dns_name".to_string(), Value::string("demo-alb.us-east-1.elb.amazonaws.com"));
        alias.insert("hosted_zone_id".to_string(), Value::string("Z35SXDOTRQ7X7K"));
        alias.insert("evaluate_target_health".to_string(), Value::Bool(false));

        Resource::new("dns_record", "demo-dns")
            .with_attribute("hosted_zone_id", Value::string("Z0123456789ABCDEF"))
            .with_attribute("name", Value::string("demo.example.com"))
            .with_attribute("record_type", Value::string("A"))
            .with_attribute("alias_target", Value::Map(alias))
    }

    #[test]
    fn spec_extracts_attributes() {
        let spec = RecordSpec::from_resource(&sample_record()).unwrap();
        assert_eq!(spec.hosted_zone_id, "Z0123456789ABCDEF");
        assert_eq!(spec.name, "demo.example.com");
        assert_eq!(spec.record_type, "A");
        assert_eq!(spec.alias_hosted_zone_id, "Z35SXDOTRQ7X7K");
        assert!(!spec.evaluate_target_health);
        assert_eq!(spec.identifier(), "Z0123456789ABCDEF:demo.example.com:A");
    }

    #[test]
    fn spec_requires_alias_target() {
        let mut resource = sample_record();
        resource.attributes.remove("alias_target");
        let err = RecordSpec::from_resource(&resource).unwrap_err();
        assert!(err.message.contains("alias_target"));
    }

    #[test]
    fn identifier_splits_back() {
        assert_eq!(
            split_identifier("Z0123:demo.example.com:A"),
            Some(("Z0123", "demo.example.com", "A"))
        );
        assert_eq!(split_identifier("missing-parts"), None);
    }

    #[test]
    fn trailing_dot_is_normalized() {
        assert_eq!(normalize_name("demo.example.com."), "demo.example.com");
        assert_eq!(normalize_name("demo.example.com"), "demo.example.com");
    }
}
