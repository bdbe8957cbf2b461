//! Schema for Route53 alias records

use nimbus_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub(super) fn schemas() -> Vec<ResourceSchema> {
    vec![dns_record()]
}

fn dns_record() -> ResourceSchema {
    ResourceSchema::new("dns_record")
        .with_description("Route53 alias record, managed through the Route53 API")
        .attribute(
            AttributeSchema::new("hosted_zone_id", AttributeType::String).required(),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "record_type",
                AttributeType::Enum(vec!["A".to_string(), "AAAA".to_string(), "CNAME".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("alias_target", AttributeType::Any).required())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use nimbus_core::resource::Value;

    use super::*;

    #[test]
    fn record_type_is_constrained() {
        let schema = dns_record();
        let mut attrs = HashMap::new();
        attrs.insert("hosted_zone_id".to_string(), Value::string("Z0123"));
        attrs.insert("name".to_string(), Value::string("demo.example.com"));
        attrs.insert("record_type".to_string(), Value::string("TXT"));
        attrs.insert("alias_target".to_string(), Value::Map(HashMap::new()));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert("record_type".to_string(), Value::string("A"));
        assert!(schema.validate(&attrs).is_ok());
    }
}
