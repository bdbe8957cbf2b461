//! Stack topology - the desired resource graph, built from configuration
//!
//! `build_stack` turns a `StackConfig` plus the region's availability zones
//! into the full ordered list of declared resources: VPC and per-zone
//! subnets, routing, security groups, the optional RDS tier, the load
//! balancer, the auto-scaling web tier with its alarms, and the optional
//! DNS record. Resources appear in dependency order so references always
//! point backwards.

pub mod compute;
pub mod database;
pub mod dns;
pub mod loadbalancer;
pub mod network;
pub mod security;
pub mod userdata;

use std::collections::HashMap;

use thiserror::Error;

use crate::cidr::{self, CidrError};
use crate::config::StackConfig;
use crate::resource::{Resource, Value};

#[derive(Debug, Error)]
pub enum StackError {
    #[error("No availability zones available in the target region")]
    NoAvailabilityZones,

    #[error("VPC CIDR {cidr} cannot hold {needed} subnets")]
    InsufficientAddressSpace { cidr: String, needed: usize },

    #[error(transparent)]
    Cidr(#[from] CidrError),
}

/// Binding names shared across the stack modules
pub mod binding {
    pub const VPC: &str = "vpc";
    pub const IGW: &str = "igw";
    pub const IGW_ATTACHMENT: &str = "igw_attachment";
    pub const PUBLIC_RT: &str = "public_rt";
    pub const PRIVATE_RT: &str = "private_rt";
    pub const PUBLIC_ROUTE: &str = "public_route";
    pub const LB_SG: &str = "lb_sg";
    pub const APP_SG: &str = "app_sg";
    pub const DB_SG: &str = "db_sg";
    pub const DB_SUBNET_GROUP: &str = "db_subnet_group";
    pub const DB_PARAMETER_GROUP: &str = "db_parameter_group";
    pub const DB_INSTANCE: &str = "db_instance";
    pub const APP_ROLE: &str = "app_role";
    pub const INSTANCE_PROFILE: &str = "instance_profile";
    pub const LAUNCH_TEMPLATE: &str = "launch_template";
    pub const ASG: &str = "asg";
    pub const SCALE_UP: &str = "scale_up";
    pub const SCALE_DOWN: &str = "scale_down";
    pub const CPU_HIGH_ALARM: &str = "cpu_high_alarm";
    pub const CPU_LOW_ALARM: &str = "cpu_low_alarm";
    pub const ALB: &str = "alb";
    pub const TARGET_GROUP: &str = "target_group";
    pub const LISTENER: &str = "listener";
    pub const DNS_RECORD: &str = "dns_record";

    pub fn public_subnet(index: usize) -> String {
        format!("public_subnet_{}", index)
    }

    pub fn private_subnet(index: usize) -> String {
        format!("private_subnet_{}", index)
    }
}

/// Name tag plus the configured extra tags
pub(crate) fn tags(config: &StackConfig, name: &str) -> Value {
    let mut map = HashMap::new();
    map.insert("Name".to_string(), Value::string(name));
    for (key, value) in &config.tags {
        map.insert(key.clone(), Value::string(value));
    }
    Value::Map(map)
}

/// Build the full desired topology in dependency order
pub fn build_stack(config: &StackConfig, zones: &[String]) -> Result<Vec<Resource>, StackError> {
    if zones.is_empty() {
        return Err(StackError::NoAvailabilityZones);
    }

    // One public and one private subnet per zone, capped by available zones
    let subnet_count = config.network.subnets_per_tier.min(zones.len());
    let needed = 2 * subnet_count;
    let cidrs = cidr::subnet_cidrs(&config.network.vpc_cidr, needed)?;
    if cidrs.len() < needed {
        return Err(StackError::InsufficientAddressSpace {
            cidr: config.network.vpc_cidr.clone(),
            needed,
        });
    }
    let (public_cidrs, private_cidrs) = cidrs.split_at(subnet_count);

    let mut resources = Vec::new();
    resources.extend(network::build(config, zones, public_cidrs, private_cidrs));
    resources.extend(security::build(config));
    if let Some(db) = &config.database {
        resources.extend(database::build(config, db, subnet_count));
    }
    resources.extend(loadbalancer::build(config, subnet_count));
    resources.extend(compute::build(config, subnet_count));
    if let Some(dns) = &config.dns {
        resources.extend(dns::build(config, dns));
    }

    Ok(resources)
}

#[cfg(test)]
pub(crate) fn sample_config() -> StackConfig {
    use crate::config::{
        ComputeConfig, DatabaseConfig, DbEngine, DnsConfig, NetworkConfig, ScalingConfig,
    };

    StackConfig {
        stack_name: "demo".to_string(),
        region: "us-east-1".to_string(),
        network: NetworkConfig {
            vpc_cidr: "10.0.0.0/16".to_string(),
            subnets_per_tier: 3,
            destination_cidr: "0.0.0.0/0".to_string(),
        },
        compute: ComputeConfig {
            ami_id: "ami-0123456789abcdef0".to_string(),
            instance_type: "t3.micro".to_string(),
            key_name: "demo-key".to_string(),
            app_port: 8080,
            ssh_ingress_cidr: "203.0.113.0/24".to_string(),
            root_volume_size_gb: 20,
            root_volume_type: "gp2".to_string(),
        },
        scaling: ScalingConfig {
            min_size: 1,
            max_size: 3,
            desired_capacity: 1,
            cpu_high_threshold: 80.0,
            cpu_low_threshold: 20.0,
            health_check_path: "/healthz".to_string(),
        },
        database: Some(DatabaseConfig {
            engine: DbEngine::Mysql,
            engine_version: "8.0.35".to_string(),
            instance_class: "db.t3.micro".to_string(),
            db_name: "webapp".to_string(),
            username: "admin".to_string(),
            password: "changeme".to_string(),
            allocated_storage_gb: 20,
        }),
        dns: Some(DnsConfig {
            hosted_zone_id: "Z0123456789ABCDEF".to_string(),
            record_name: "demo.example.com".to_string(),
        }),
        backend: Default::default(),
        tags: Default::default(),
    }
}

#[cfg(test)]
pub(crate) fn sample_zones() -> Vec<String> {
    vec![
        "us-east-1a".to_string(),
        "us-east-1b".to_string(),
        "us-east-1c".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::resource::Value;

    fn collect_refs(value: &Value, refs: &mut Vec<(String, String)>) {
        match value {
            Value::Ref(binding, attr) => refs.push((binding.clone(), attr.clone())),
            Value::List(items) => {
                for item in items {
                    collect_refs(item, refs);
                }
            }
            Value::Map(map) => {
                for v in map.values() {
                    collect_refs(v, refs);
                }
            }
            _ => {}
        }
    }

    #[test]
    fn every_reference_points_backwards() {
        let config = sample_config();
        let resources = build_stack(&config, &sample_zones()).unwrap();

        let mut declared: HashSet<String> = HashSet::new();
        for resource in &resources {
            let mut refs = Vec::new();
            for value in resource.attributes.values() {
                collect_refs(value, &mut refs);
            }
            for (binding, _) in refs {
                assert!(
                    declared.contains(&binding),
                    "{}.{} refers to '{}' before it is declared",
                    resource.id.resource_type,
                    resource.id.name,
                    binding
                );
            }
            if let Some(binding) = resource.binding() {
                declared.insert(binding.to_string());
            }
        }
    }

    #[test]
    fn bindings_are_unique() {
        let config = sample_config();
        let resources = build_stack(&config, &sample_zones()).unwrap();

        let mut seen = HashSet::new();
        for resource in &resources {
            let binding = resource
                .binding()
                .unwrap_or_else(|| panic!("{} has no binding", resource.id.name));
            assert!(seen.insert(binding.to_string()), "duplicate binding {}", binding);
        }
    }

    #[test]
    fn subnet_count_is_capped_by_zones() {
        let mut config = sample_config();
        config.network.subnets_per_tier = 5;
        let zones = vec!["us-east-1a".to_string(), "us-east-1b".to_string()];
        let resources = build_stack(&config, &zones).unwrap();

        let subnets = resources
            .iter()
            .filter(|r| r.id.resource_type == "subnet")
            .count();
        assert_eq!(subnets, 4); // 2 public + 2 private
    }

    #[test]
    fn no_zones_is_an_error() {
        let config = sample_config();
        assert!(matches!(
            build_stack(&config, &[]),
            Err(StackError::NoAvailabilityZones)
        ));
    }

    #[test]
    fn narrow_vpc_is_an_error() {
        let mut config = sample_config();
        config.network.vpc_cidr = "10.0.240.0/20".to_string();
        assert!(matches!(
            build_stack(&config, &sample_zones()),
            Err(StackError::InsufficientAddressSpace { needed: 6, .. })
        ));
    }

    #[test]
    fn database_section_is_optional() {
        let mut config = sample_config();
        config.database = None;
        config.dns = None;
        let resources = build_stack(&config, &sample_zones()).unwrap();

        for resource in &resources {
            assert!(
                !resource.id.resource_type.starts_with("db_"),
                "unexpected {} without a database section",
                resource.id.resource_type
            );
            assert_ne!(resource.id.resource_type, "dns_record");
        }
        assert!(!resources.iter().any(|r| r.binding() == Some(binding::DB_SG)));
    }

    #[test]
    fn full_stack_resource_counts() {
        let config = sample_config();
        let resources = build_stack(&config, &sample_zones()).unwrap();

        let count = |t: &str| {
            resources
                .iter()
                .filter(|r| r.id.resource_type == t)
                .count()
        };

        assert_eq!(count("vpc"), 1);
        assert_eq!(count("internet_gateway"), 1);
        assert_eq!(count("subnet"), 6);
        assert_eq!(count("route_table"), 2);
        assert_eq!(count("route_table_association"), 6);
        assert_eq!(count("route"), 1);
        assert_eq!(count("security_group"), 3);
        assert_eq!(count("db_instance"), 1);
        assert_eq!(count("load_balancer"), 1);
        assert_eq!(count("autoscaling_group"), 1);
        assert_eq!(count("scaling_policy"), 2);
        assert_eq!(count("cloudwatch_alarm"), 2);
        assert_eq!(count("dns_record"), 1);
    }
}
