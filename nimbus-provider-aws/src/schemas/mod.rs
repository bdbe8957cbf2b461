//! Attribute schemas for pre-flight validation
//!
//! One schema per resource type this provider manages. The CLI validates the
//! whole topology against these before touching any API.

mod compute;
mod database;
mod dns;
mod network;

use nimbus_core::schema::ResourceSchema;

/// Returns the schemas for every supported resource type
pub fn all_schemas() -> Vec<ResourceSchema> {
    let mut schemas = Vec::new();
    schemas.extend(network::schemas());
    schemas.extend(compute::schemas());
    schemas.extend(database::schemas());
    schemas.extend(dns::schemas());
    schemas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::get_resource_config;

    #[test]
    fn schema_types_are_unique() {
        let schemas = all_schemas();
        let mut seen = std::collections::HashSet::new();
        for schema in &schemas {
            assert!(
                seen.insert(schema.resource_type.clone()),
                "duplicate schema for {}",
                schema.resource_type
            );
        }
    }

    #[test]
    fn every_schema_matches_a_resource_config() {
        for schema in all_schemas() {
            if schema.resource_type == "dns_record" {
                continue; // Managed through the Route53 API, no Cloud Control config
            }
            assert!(
                get_resource_config(&schema.resource_type).is_some(),
                "schema {} has no resource config",
                schema.resource_type
            );
        }
    }

    #[test]
    fn schema_attributes_exist_in_the_mapping_tables() {
        for schema in all_schemas() {
            let Some(config) = get_resource_config(&schema.resource_type) else {
                continue;
            };
            for name in schema.attributes.keys() {
                if name == "tags" && config.has_tags {
                    continue; // Rendered through the shared tag handling
                }
                assert!(
                    config.attributes.iter().any(|(nimbus, _)| nimbus == name),
                    "{}.{} is not in the resource config mapping",
                    schema.resource_type,
                    name
                );
            }
        }
    }
}
