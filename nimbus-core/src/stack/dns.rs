//! DNS tier - Route53 alias record pointing at the load balancer

use std::collections::HashMap;

use crate::config::{DnsConfig, StackConfig};
use crate::resource::{Resource, Value};

use super::binding;

pub fn build(config: &StackConfig, dns: &DnsConfig) -> Vec<Resource> {
    let mut alias = HashMap::new();
    alias.insert(
        "dns_name".to_string(),
        Value::reference(binding::ALB, "dns_name"),
    );
    alias.insert(
        "hosted_zone_id".to_string(),
        Value::reference(binding::ALB, "canonical_hosted_zone_id"),
    );
    alias.insert("evaluate_target_health".to_string(), Value::Bool(false));

    vec![
        Resource::new("dns_record", format!("{}-dns", config.stack_name))
            .with_binding(binding::DNS_RECORD)
            .with_attribute("hosted_zone_id", Value::string(&dns.hosted_zone_id))
            .with_attribute("name", Value::string(&dns.record_name))
            .with_attribute("record_type", Value::string("A"))
            .with_attribute("alias_target", Value::Map(alias)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::sample_config;

    #[test]
    fn alias_points_at_the_load_balancer() {
        let config = sample_config();
        let dns = config.dns.clone().unwrap();
        let resources = build(&config, &dns);

        assert_eq!(resources.len(), 1);
        let record = &resources[0];
        assert_eq!(record.attributes.get("record_type"), Some(&Value::string("A")));
        assert_eq!(
            record.attributes.get("name"),
            Some(&Value::string("demo.example.com"))
        );

        let Some(Value::Map(alias)) = record.attributes.get("alias_target") else {
            panic!("Expected alias target map");
        };
        assert_eq!(
            alias.get("dns_name"),
            Some(&Value::reference(binding::ALB, "dns_name"))
        );
        assert_eq!(
            alias.get("hosted_zone_id"),
            Some(&Value::reference(binding::ALB, "canonical_hosted_zone_id"))
        );
    }
}
