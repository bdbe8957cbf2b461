//! Security tier - security groups and their ingress rules
//!
//! Three groups: the load balancer accepts HTTP/HTTPS from anywhere, the
//! application tier accepts its port only from the load balancer (plus SSH
//! from the configured range), and the database accepts its engine port only
//! from the application tier. Egress is the VPC default (allow all).

use crate::config::StackConfig;
use crate::resource::{Resource, Value};

use super::{binding, tags};

pub fn build(config: &StackConfig) -> Vec<Resource> {
    let stack = &config.stack_name;
    let mut out = Vec::new();

    let lb_sg_name = format!("{}-lb-sg", stack);
    out.push(security_group(
        config,
        &lb_sg_name,
        binding::LB_SG,
        "Load balancer traffic",
    ));
    out.push(cidr_ingress(stack, "lb-http", binding::LB_SG, 80, "0.0.0.0/0"));
    out.push(cidr_ingress(stack, "lb-https", binding::LB_SG, 443, "0.0.0.0/0"));

    let app_sg_name = format!("{}-app-sg", stack);
    out.push(security_group(
        config,
        &app_sg_name,
        binding::APP_SG,
        "Application instances",
    ));
    out.push(group_ingress(
        stack,
        "app-port",
        binding::APP_SG,
        i64::from(config.compute.app_port),
        binding::LB_SG,
    ));
    out.push(cidr_ingress(
        stack,
        "app-ssh",
        binding::APP_SG,
        22,
        &config.compute.ssh_ingress_cidr,
    ));

    if let Some(db) = &config.database {
        let db_sg_name = format!("{}-db-sg", stack);
        out.push(security_group(
            config,
            &db_sg_name,
            binding::DB_SG,
            "Database access from the application tier",
        ));
        out.push(group_ingress(
            stack,
            "db-port",
            binding::DB_SG,
            i64::from(db.engine.port()),
            binding::APP_SG,
        ));
    }

    out
}

fn security_group(
    config: &StackConfig,
    name: &str,
    group_binding: &str,
    description: &str,
) -> Resource {
    Resource::new("security_group", name)
        .with_binding(group_binding)
        .with_attribute("group_name", Value::string(name))
        .with_attribute("description", Value::string(description))
        .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
        .with_attribute("tags", tags(config, name))
}

/// TCP ingress rule open to a CIDR range
fn cidr_ingress(stack: &str, rule: &str, group: &str, port: i64, cidr: &str) -> Resource {
    ingress(stack, rule, group, port).with_attribute("cidr_ip", Value::string(cidr))
}

/// TCP ingress rule open to another security group
fn group_ingress(stack: &str, rule: &str, group: &str, port: i64, source_group: &str) -> Resource {
    ingress(stack, rule, group, port).with_attribute(
        "source_security_group_id",
        Value::reference(source_group, "group_id"),
    )
}

fn ingress(stack: &str, rule: &str, group: &str, port: i64) -> Resource {
    Resource::new("security_group_ingress", format!("{}-{}", stack, rule))
        .with_binding(format!("{}_{}", group, rule.replace('-', "_")))
        .with_attribute("security_group_id", Value::reference(group, "group_id"))
        .with_attribute("ip_protocol", Value::string("tcp"))
        .with_attribute("from_port", Value::Int(port))
        .with_attribute("to_port", Value::Int(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::sample_config;

    #[test]
    fn three_groups_with_a_database() {
        let resources = build(&sample_config());
        let groups = resources
            .iter()
            .filter(|r| r.id.resource_type == "security_group")
            .count();
        assert_eq!(groups, 3);
    }

    #[test]
    fn two_groups_without_a_database() {
        let mut config = sample_config();
        config.database = None;
        let resources = build(&config);
        let groups = resources
            .iter()
            .filter(|r| r.id.resource_type == "security_group")
            .count();
        assert_eq!(groups, 2);
    }

    #[test]
    fn app_port_only_from_load_balancer() {
        let resources = build(&sample_config());
        let rule = resources
            .iter()
            .find(|r| r.id.name == "demo-app-port")
            .unwrap();
        assert_eq!(rule.attributes.get("from_port"), Some(&Value::Int(8080)));
        assert_eq!(
            rule.attributes.get("source_security_group_id"),
            Some(&Value::reference(binding::LB_SG, "group_id"))
        );
        assert!(!rule.attributes.contains_key("cidr_ip"));
    }

    #[test]
    fn ssh_uses_configured_range() {
        let resources = build(&sample_config());
        let rule = resources
            .iter()
            .find(|r| r.id.name == "demo-app-ssh")
            .unwrap();
        assert_eq!(rule.attributes.get("from_port"), Some(&Value::Int(22)));
        assert_eq!(
            rule.attributes.get("cidr_ip"),
            Some(&Value::string("203.0.113.0/24"))
        );
    }

    #[test]
    fn database_port_follows_engine() {
        let mut config = sample_config();
        config.database.as_mut().unwrap().engine = crate::config::DbEngine::Postgres;
        let resources = build(&config);
        let rule = resources
            .iter()
            .find(|r| r.id.name == "demo-db-port")
            .unwrap();
        assert_eq!(rule.attributes.get("from_port"), Some(&Value::Int(5432)));
        assert_eq!(
            rule.attributes.get("source_security_group_id"),
            Some(&Value::reference(binding::APP_SG, "group_id"))
        );
    }
}
