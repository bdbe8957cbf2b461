//! Network tier - VPC, gateway, subnets and routing

use crate::config::StackConfig;
use crate::resource::{Resource, Value};

use super::{binding, tags};

pub fn build(
    config: &StackConfig,
    zones: &[String],
    public_cidrs: &[String],
    private_cidrs: &[String],
) -> Vec<Resource> {
    let stack = &config.stack_name;
    let mut out = Vec::new();

    let vpc_name = format!("{}-vpc", stack);
    out.push(
        Resource::new("vpc", &vpc_name)
            .with_binding(binding::VPC)
            .with_attribute("cidr_block", Value::string(&config.network.vpc_cidr))
            .with_attribute("instance_tenancy", Value::string("default"))
            .with_attribute("enable_dns_support", Value::Bool(true))
            .with_attribute("enable_dns_hostnames", Value::Bool(true))
            .with_attribute("tags", tags(config, &vpc_name)),
    );

    let igw_name = format!("{}-igw", stack);
    out.push(
        Resource::new("internet_gateway", &igw_name)
            .with_binding(binding::IGW)
            .with_attribute("tags", tags(config, &igw_name)),
    );
    out.push(
        Resource::new("vpc_gateway_attachment", format!("{}-igw-attachment", stack))
            .with_binding(binding::IGW_ATTACHMENT)
            .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
            .with_attribute(
                "internet_gateway_id",
                Value::reference(binding::IGW, "internet_gateway_id"),
            ),
    );

    for (i, cidr) in public_cidrs.iter().enumerate() {
        let name = format!("{}-public-{}", stack, i);
        out.push(
            Resource::new("subnet", &name)
                .with_binding(binding::public_subnet(i))
                .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
                .with_attribute("cidr_block", Value::string(cidr))
                .with_attribute("availability_zone", Value::string(&zones[i]))
                .with_attribute("map_public_ip_on_launch", Value::Bool(true))
                .with_attribute("tags", tags(config, &name)),
        );
    }

    for (i, cidr) in private_cidrs.iter().enumerate() {
        let name = format!("{}-private-{}", stack, i);
        out.push(
            Resource::new("subnet", &name)
                .with_binding(binding::private_subnet(i))
                .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
                .with_attribute("cidr_block", Value::string(cidr))
                .with_attribute("availability_zone", Value::string(&zones[i]))
                .with_attribute("map_public_ip_on_launch", Value::Bool(false))
                .with_attribute("tags", tags(config, &name)),
        );
    }

    let public_rt_name = format!("{}-public-rt", stack);
    out.push(
        Resource::new("route_table", &public_rt_name)
            .with_binding(binding::PUBLIC_RT)
            .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
            .with_attribute("tags", tags(config, &public_rt_name)),
    );
    for i in 0..public_cidrs.len() {
        out.push(
            Resource::new("route_table_association", format!("{}-public-rt-assoc-{}", stack, i))
                .with_binding(format!("public_rt_assoc_{}", i))
                .with_attribute(
                    "subnet_id",
                    Value::reference(binding::public_subnet(i), "subnet_id"),
                )
                .with_attribute(
                    "route_table_id",
                    Value::reference(binding::PUBLIC_RT, "route_table_id"),
                ),
        );
    }

    let private_rt_name = format!("{}-private-rt", stack);
    out.push(
        Resource::new("route_table", &private_rt_name)
            .with_binding(binding::PRIVATE_RT)
            .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
            .with_attribute("tags", tags(config, &private_rt_name)),
    );
    for i in 0..private_cidrs.len() {
        out.push(
            Resource::new(
                "route_table_association",
                format!("{}-private-rt-assoc-{}", stack, i),
            )
            .with_binding(format!("private_rt_assoc_{}", i))
            .with_attribute(
                "subnet_id",
                Value::reference(binding::private_subnet(i), "subnet_id"),
            )
            .with_attribute(
                "route_table_id",
                Value::reference(binding::PRIVATE_RT, "route_table_id"),
            ),
        );
    }

    // Only the public table routes out through the gateway
    out.push(
        Resource::new("route", format!("{}-public-default-route", stack))
            .with_binding(binding::PUBLIC_ROUTE)
            .with_attribute(
                "route_table_id",
                Value::reference(binding::PUBLIC_RT, "route_table_id"),
            )
            .with_attribute(
                "destination_cidr_block",
                Value::string(&config.network.destination_cidr),
            )
            .with_attribute(
                "gateway_id",
                Value::reference(binding::IGW, "internet_gateway_id"),
            ),
    );

    out
}
